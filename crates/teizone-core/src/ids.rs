//! Annotation identity and friendly id building
//!
//! The canonical key of an annotation is `{group}/{imageId}/{eid}`. Keys are
//! not unique: several annotations may mark the same entity on one image.
//! Runs of equal keys are disambiguated with `-01`, `-02`, ... suffixes.

/// Friendly image id, `{group}/{imageId}`
#[inline]
#[must_use]
pub fn image_key(group_id: &str, image_id: &str) -> String {
    format!("{group_id}/{image_id}")
}

/// Unsuffixed annotation key, `{imageKey}/{eid}`
#[inline]
#[must_use]
pub fn annotation_key(image_key: &str, eid: &str) -> String {
    format!("{image_key}/{eid}")
}

/// Build friendly ids for keys presorted by unsuffixed key
///
/// Returns one id per key in the same order. Each maximal run of two or more
/// equal consecutive keys gets ordinal suffixes in run order; single keys
/// are kept bare.
#[must_use]
pub fn build_ids<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    let mut ids = Vec::with_capacity(keys.len());
    let mut start = 0;
    while start < keys.len() {
        let key = keys[start].as_ref();
        let run = keys[start..]
            .iter()
            .take_while(|k| k.as_ref() == key)
            .count();
        if run == 1 {
            ids.push(key.to_string());
        } else {
            ids.extend((1..=run).map(|i| format!("{key}-{i:02}")));
        }
        start += run;
    }
    ids
}

/// Whether `friendly_id` is `key` itself or `key` plus an ordinal suffix
///
/// Only a `-` followed by digits counts as a suffix.
#[must_use]
pub fn shares_entry(friendly_id: &str, key: &str) -> bool {
    match friendly_id.strip_prefix(key) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('-')
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}
