//! Space-separated token list attributes (`ids`, `corresp`, `facs`)

use std::collections::BTreeSet;

/// Split a token list attribute
#[inline]
pub fn split(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}

/// Whether the list contains `token`
#[must_use]
pub fn contains(value: &str, token: &str) -> bool {
    split(value).any(|t| t == token)
}

/// Union of an existing list and new tokens, deduplicated and byte-sorted
#[must_use]
pub fn union<'a, I>(existing: Option<&'a str>, tokens: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut set: BTreeSet<&'a str> = existing.map(|v| split(v).collect()).unwrap_or_default();
    set.extend(tokens.into_iter().filter(|t| !t.trim().is_empty()));
    set.into_iter().collect::<Vec<_>>().join(" ")
}

/// `#`-prefixed pointer to an identifier
#[inline]
#[must_use]
pub fn pointer(id: &str) -> String {
    format!("#{}", bare_id(id))
}

/// Identifier without a leading `#`, as used in `xml:id`
#[inline]
#[must_use]
pub fn bare_id(id: &str) -> &str {
    id.strip_prefix('#').unwrap_or(id)
}
