//! Incremental merge of items into a TEI document
//!
//! Each item (one page image with its annotations) is merged into the
//! document's `facsimile` and `text/body`:
//!
//! - one `surface` per item, identified by `xml:id` = item id, sorted by `n`;
//! - one `zone` per annotation, identified by `xml:id` = annotation id,
//!   sorted by friendly id within its surface;
//! - one `pb` per item, identified by `facs` = `#itemId`, sorted by `n`;
//! - one `div` per entity, between the page's `pb` and the next one, sorted
//!   by the unsuffixed annotation key. Annotations sharing that key on a page
//!   are merged into a single `div`.
//!
//! Merging is idempotent: nodes are found by identity before being created,
//! so composing the same item twice changes nothing. Nodes are never deleted.

use crate::entity::EntityKind;
use crate::error::{Result, TeiError};
use crate::ids::{annotation_key, build_ids, image_key, shares_entry};
use crate::model::{Annotation, Item};
use crate::tei::{self, attr, find_child_by_attr, xml_id};
use crate::tokens;
use teizone_svg::apply_selector;
use teizone_xml::{insert_in_order, Document, NodeId};

/// Target of a merge: the current group and its document
#[derive(Debug)]
pub struct ComposeContext<'a> {
    /// Group (manuscript) id of the document
    pub group_id: &'a str,
    /// Document being composed
    pub document: &'a mut Document,
}

impl<'a> ComposeContext<'a> {
    /// Create a context
    pub fn new(group_id: &'a str, document: &'a mut Document) -> Self {
        Self { group_id, document }
    }
}

/// Counters for one or more merged items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeReport {
    /// Items merged
    pub items: usize,
    /// Items skipped for lack of annotations or image
    pub skipped: usize,
    /// Surfaces created
    pub surfaces_added: usize,
    /// Zones created
    pub zones_added: usize,
    /// Existing zones refreshed
    pub zones_updated: usize,
    /// Entries created
    pub entries_added: usize,
    /// Existing entries refreshed
    pub entries_updated: usize,
    /// Annotations merged into the preceding entry
    pub entries_merged: usize,
    /// Annotations whose eid maps to no entry type
    pub unrecognized: usize,
}

impl ComposeReport {
    /// Add the counters of another report
    pub fn absorb(&mut self, other: &Self) {
        self.items += other.items;
        self.skipped += other.skipped;
        self.surfaces_added += other.surfaces_added;
        self.zones_added += other.zones_added;
        self.zones_updated += other.zones_updated;
        self.entries_added += other.entries_added;
        self.entries_updated += other.entries_updated;
        self.entries_merged += other.entries_merged;
        self.unrecognized += other.unrecognized;
    }
}

/// How an annotation found its body entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryMatch {
    /// Preceding entry already holds the same unsuffixed key
    Merged,
    /// Entry already lists this annotation
    Updated,
    /// New entry, not yet in the tree
    Created,
}

/// Page anchors in the body
#[derive(Debug, Clone, Copy)]
struct Page {
    body: NodeId,
    surface: NodeId,
    pb: NodeId,
}

/// Merge one item into the context document
///
/// Items without an image-annotations part, without annotations or without
/// a target image are skipped.
///
/// # Errors
///
/// Returns an error if:
/// - The group id is empty (`TeiError::InvalidArgument`)
/// - The document has no `facsimile` or `text/body` (`TeiError::InvalidState`)
/// - A selector cannot be converted (`TeiError::InvalidSelector`)
pub fn merge_item(ctx: &mut ComposeContext<'_>, item: &Item) -> Result<ComposeReport> {
    let mut report = ComposeReport::default();

    let Some(part) = item.annotations_part() else {
        log::debug!("Item {} has no image annotations, skipped", item.id);
        report.skipped = 1;
        return Ok(report);
    };
    let Some(image) = part.target_image() else {
        log::debug!("Item {} has no target image, skipped", item.id);
        report.skipped = 1;
        return Ok(report);
    };
    if part.annotations.is_empty() {
        log::debug!("Item {} has no annotations, skipped", item.id);
        report.skipped = 1;
        return Ok(report);
    }
    if ctx.group_id.trim().is_empty() {
        return Err(TeiError::InvalidArgument("group id is empty".to_string()));
    }

    let doc = &mut *ctx.document;
    let facsimile = tei::facsimile(doc)
        .ok_or_else(|| TeiError::InvalidState("expected facsimile element".to_string()))?;
    let body = tei::body(doc)
        .ok_or_else(|| TeiError::InvalidState("expected body element".to_string()))?;

    let page_key = image_key(ctx.group_id, &image.id);
    let item_id = tokens::bare_id(&item.id).to_string();

    let (surface, created) = upsert_surface(doc, facsimile, &item_id, &page_key, &image.uri)?;
    if created {
        report.surfaces_added += 1;
    }
    let pb = upsert_pb(doc, body, &item_id, &page_key)?;
    let page = Page { body, surface, pb };

    let mut annotations: Vec<(String, &Annotation)> = part
        .annotations
        .iter()
        .map(|a| (annotation_key(&page_key, &a.eid), a))
        .collect();
    // stable: annotations sharing a key keep their input order
    annotations.sort_by(|a, b| a.0.cmp(&b.0));
    let keys: Vec<&str> = annotations.iter().map(|(k, _)| k.as_str()).collect();
    let friendly_ids = build_ids(&keys);

    let mut previous: Option<NodeId> = None;
    for ((key, annotation), friendly_id) in annotations.iter().zip(&friendly_ids) {
        let zone_id = tokens::bare_id(&annotation.id);
        if upsert_zone(doc, page.surface, zone_id, friendly_id, &annotation.selector)? {
            report.zones_added += 1;
        } else {
            report.zones_updated += 1;
        }

        let (entry, matched) = find_entry(doc, page, previous, key, zone_id);
        let moved = matched == EntryMatch::Updated && doc.attr(entry, &attr("n")) != Some(key.as_str());
        let kind = EntityKind::from_eid(&annotation.eid);
        populate_entry(doc, entry, matched, key, friendly_id, zone_id, annotation, kind)?;
        if !kind.is_known() {
            report.unrecognized += 1;
            let warning = TeiError::UnrecognizedEntityKind {
                annotation_id: annotation.id.clone(),
                eid: annotation.eid.clone(),
            };
            log::warn!("{warning}");
        }

        match matched {
            EntryMatch::Created => {
                place_entry(doc, page, entry)?;
                report.entries_added += 1;
                log::debug!("Added entry {key}");
            }
            EntryMatch::Updated => {
                if moved {
                    place_entry(doc, page, entry)?;
                    log::debug!("Moved entry to {key}");
                }
                report.entries_updated += 1;
            }
            EntryMatch::Merged => report.entries_merged += 1,
        }
        previous = Some(entry);
    }

    report.items = 1;
    log::info!(
        "Composed item {} ({page_key}): {} annotation(s)",
        item.id,
        annotations.len()
    );
    Ok(report)
}

/// Find or create the surface of an item; returns whether it was created
fn upsert_surface(
    doc: &mut Document,
    facsimile: NodeId,
    item_id: &str,
    page_key: &str,
    uri: &str,
) -> Result<(NodeId, bool)> {
    let n = attr("n");
    if let Some(surface) = find_child_by_attr(doc, facsimile, &tei::tei("surface"), &xml_id(), item_id) {
        let moved = doc.attr(surface, &n) != Some(page_key);
        doc.set_attr(surface, n.clone(), page_key);
        doc.set_attr(surface, attr("source"), uri);
        if moved {
            insert_in_order(doc, facsimile, surface, &n, None, None)?;
        }
        return Ok((surface, false));
    }

    let surface = doc.create_element(tei::tei("surface"));
    doc.set_attr(surface, xml_id(), item_id);
    doc.set_attr(surface, n.clone(), page_key);
    doc.set_attr(surface, attr("source"), uri);
    insert_in_order(doc, facsimile, surface, &n, None, None)?;
    log::debug!("Added surface {page_key}");
    Ok((surface, true))
}

/// Find or create the page break of an item
fn upsert_pb(doc: &mut Document, body: NodeId, item_id: &str, page_key: &str) -> Result<NodeId> {
    let n = attr("n");
    let facs = tokens::pointer(item_id);
    if let Some(pb) = find_child_by_attr(doc, body, &tei::tei("pb"), &attr("facs"), &facs) {
        if doc.attr(pb, &n) != Some(page_key) {
            // moving a pb leaves its entries behind; only the anchor moves
            doc.set_attr(pb, n.clone(), page_key);
            insert_in_order(doc, body, pb, &n, None, None)?;
        }
        return Ok(pb);
    }

    let pb = doc.create_element(tei::tei("pb"));
    doc.set_attr(pb, n.clone(), page_key);
    doc.set_attr(pb, attr("facs"), facs);
    insert_in_order(doc, body, pb, &n, None, None)?;
    Ok(pb)
}

/// Find or create a zone and (re)apply its geometry; returns whether it was created
fn upsert_zone(
    doc: &mut Document,
    surface: NodeId,
    zone_id: &str,
    friendly_id: &str,
    selector: &str,
) -> Result<bool> {
    let n = attr("n");
    if let Some(zone) = find_child_by_attr(doc, surface, &tei::tei("zone"), &xml_id(), zone_id) {
        apply_selector(doc, zone, selector)?;
        if doc.attr(zone, &n) != Some(friendly_id) {
            doc.set_attr(zone, n.clone(), friendly_id);
            insert_in_order(doc, surface, zone, &n, None, None)?;
        }
        return Ok(false);
    }

    let zone = doc.create_element(tei::tei("zone"));
    doc.set_attr(zone, xml_id(), zone_id);
    doc.set_attr(zone, n.clone(), friendly_id);
    apply_selector(doc, zone, selector)?;
    insert_in_order(doc, surface, zone, &n, None, None)?;
    log::debug!("Added zone {friendly_id}");
    Ok(true)
}

/// Entry of this page whose `n` is `key`, between its pb and the next one
fn entry_on_page(doc: &Document, pb: NodeId, key: &str) -> Option<NodeId> {
    let pb_name = tei::tei("pb");
    let div_name = tei::tei("div");
    let n = attr("n");
    let mut current = doc.next_sibling(pb);
    while let Some(id) = current {
        if doc.is_named(id, &pb_name) {
            return None;
        }
        if doc.is_named(id, &div_name) && doc.attr(id, &n) == Some(key) {
            return Some(id);
        }
        current = doc.next_sibling(id);
    }
    None
}

/// Choose the entry for an annotation: merge, update or create
///
/// An annotation that is first in its run of equal keys takes over the
/// page's entry for that key when it has no entry of its own, so a new twin
/// sorting before an existing annotation does not open a second entry.
fn find_entry(
    doc: &mut Document,
    page: Page,
    previous: Option<NodeId>,
    key: &str,
    zone_id: &str,
) -> (NodeId, EntryMatch) {
    let corresp = attr("corresp");
    if let Some(prev) = previous {
        let shared = doc.attr(prev, &corresp).is_some_and(|refs| {
            tokens::split(refs).any(|t| shares_entry(tokens::bare_id(t), key))
        });
        if shared {
            return (prev, EntryMatch::Merged);
        }
    }

    let ids = attr("ids");
    let existing = doc
        .child_elements_named(page.body, &tei::tei("div"))
        .find(|&d| doc.attr(d, &ids).is_some_and(|v| tokens::contains(v, zone_id)))
        .or_else(|| entry_on_page(doc, page.pb, key));
    match existing {
        Some(entry) => (entry, EntryMatch::Updated),
        None => (doc.create_element(tei::tei("div")), EntryMatch::Created),
    }
}

/// Write structural references and content into an entry
#[allow(clippy::too_many_arguments)]
fn populate_entry(
    doc: &mut Document,
    entry: NodeId,
    matched: EntryMatch,
    key: &str,
    friendly_id: &str,
    zone_id: &str,
    annotation: &Annotation,
    kind: EntityKind,
) -> Result<()> {
    let n = attr("n");
    let ids = attr("ids");
    let corresp = attr("corresp");
    let facs = attr("facs");
    let corresp_ref = tokens::pointer(friendly_id);
    let facs_ref = tokens::pointer(zone_id);

    if matched == EntryMatch::Merged {
        let merged_ids = tokens::union(doc.attr(entry, &ids), [zone_id]);
        let merged_corresp = tokens::union(doc.attr(entry, &corresp), [corresp_ref.as_str()]);
        let merged_facs = tokens::union(doc.attr(entry, &facs), [facs_ref.as_str()]);
        doc.set_attr(entry, ids, merged_ids);
        doc.set_attr(entry, corresp, merged_corresp);
        doc.set_attr(entry, facs, merged_facs);
    } else {
        doc.set_attr(entry, n, key);
        if let Some(type_name) = kind.type_name() {
            doc.set_attr(entry, attr("type"), type_name);
        }
        doc.set_attr(entry, ids, zone_id);
        doc.set_attr(entry, corresp, corresp_ref);
        doc.set_attr(entry, facs, facs_ref);
    }

    if kind.is_known() {
        let keep_existing = matched == EntryMatch::Merged;
        let label = content_text(doc, entry, "label", annotation.label.as_deref(), keep_existing);
        let note = content_text(doc, entry, "note", annotation.note.as_deref(), keep_existing);
        write_content(doc, entry, label, note)?;
    }
    Ok(())
}

/// Resolve an entry's `label` or `note` text
///
/// Merged entries keep the text of the first annotation that supplied one.
fn content_text(
    doc: &Document,
    entry: NodeId,
    local: &str,
    incoming: Option<&str>,
    keep_existing: bool,
) -> Option<String> {
    let incoming = incoming.map(str::trim).filter(|t| !t.is_empty());
    if keep_existing {
        let current = doc
            .first_child_named(entry, &tei::tei(local))
            .map(|c| doc.text(c))
            .filter(|t| !t.is_empty());
        if current.is_some() {
            return current;
        }
    }
    incoming.map(str::to_string)
}

/// Replace `label` and `note` children, in that order
fn write_content(
    doc: &mut Document,
    entry: NodeId,
    label: Option<String>,
    note: Option<String>,
) -> Result<()> {
    for local in ["label", "note"] {
        let stale: Vec<NodeId> = doc.child_elements_named(entry, &tei::tei(local)).collect();
        for node in stale {
            doc.detach(node);
        }
    }
    for (local, text) in [("label", label), ("note", note)] {
        let Some(text) = text else {
            continue;
        };
        let element = doc.create_element(tei::tei(local));
        doc.set_text(element, text);
        doc.append_child(entry, element)?;
    }
    Ok(())
}

/// Insert a new entry between its page break and the next one
fn place_entry(doc: &mut Document, page: Page, entry: NodeId) -> Result<()> {
    let next_pb = doc.next_sibling_named(page.pb, &tei::tei("pb"));
    insert_in_order(doc, page.body, entry, &attr("n"), Some(page.pb), next_pb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderConfig;
    use crate::model::{ImageAnnotationsPart, Part, TargetImage};
    use crate::tei::new_document;

    fn annotation(id: &str, eid: &str, selector: &str) -> Annotation {
        Annotation {
            id: id.to_string(),
            eid: eid.to_string(),
            selector: selector.to_string(),
            ..Annotation::default()
        }
    }

    fn item(id: &str, image_id: &str, annotations: Vec<Annotation>) -> Item {
        Item {
            id: id.to_string(),
            group_id: "g".to_string(),
            parts: vec![Part::ImageAnnotations(ImageAnnotationsPart {
                image: Some(TargetImage {
                    id: image_id.to_string(),
                    uri: format!("http://img.org/{image_id}.jpg"),
                    ..TargetImage::default()
                }),
                annotations,
            })],
            ..Item::default()
        }
    }

    fn body_sequence(doc: &Document) -> Vec<String> {
        let body = tei::body(doc).expect("body");
        doc.child_elements(body)
            .map(|c| {
                let local = doc.name(c).map(|n| n.local_name().to_string()).unwrap_or_default();
                format!("{local}:{}", doc.attr(c, &attr("n")).unwrap_or_default())
            })
            .collect()
    }

    #[test]
    fn test_skips_item_without_annotations() {
        let mut doc = new_document("g", &HeaderConfig::default()).expect("skeleton");
        let before = doc.to_xml_string().unwrap();
        let mut ctx = ComposeContext::new("g", &mut doc);
        let report = merge_item(&mut ctx, &item("i1", "1", vec![])).expect("merge");
        assert_eq!(report.skipped, 1);
        assert_eq!(doc.to_xml_string().unwrap(), before);
    }

    #[test]
    fn test_missing_body_is_invalid_state() {
        let mut doc = Document::new(tei::tei("TEI"));
        let facsimile = doc.create_element(tei::tei("facsimile"));
        let root = doc.root();
        doc.append_child(root, facsimile).unwrap();
        let mut ctx = ComposeContext::new("g", &mut doc);
        let it = item("i1", "1", vec![annotation("a", "n-x", "xywh=pixel:0,0,1,1")]);
        assert!(matches!(merge_item(&mut ctx, &it), Err(TeiError::InvalidState(_))));
    }

    #[test]
    fn test_empty_group_is_invalid_argument() {
        let mut doc = new_document("g", &HeaderConfig::default()).expect("skeleton");
        let mut ctx = ComposeContext::new(" ", &mut doc);
        let it = item("i1", "1", vec![annotation("a", "n-x", "xywh=pixel:0,0,1,1")]);
        assert!(matches!(merge_item(&mut ctx, &it), Err(TeiError::InvalidArgument(_))));
    }

    #[test]
    fn test_entries_stay_within_their_page() {
        let mut doc = new_document("g", &HeaderConfig::default()).expect("skeleton");
        let mut ctx = ComposeContext::new("g", &mut doc);
        merge_item(
            &mut ctx,
            &item("i2", "2", vec![annotation("b1", "n-zeta", "xywh=pixel:0,0,1,1")]),
        )
        .unwrap();
        merge_item(
            &mut ctx,
            &item(
                "i1",
                "1",
                vec![
                    annotation("a2", "t-title", "xywh=pixel:0,0,1,1"),
                    annotation("a1", "n-aaron", "xywh=pixel:0,0,1,1"),
                ],
            ),
        )
        .unwrap();

        assert_eq!(
            body_sequence(&doc),
            ["pb:g/1", "div:g/1/n-aaron", "div:g/1/t-title", "pb:g/2", "div:g/2/n-zeta"]
        );
    }

    #[test]
    fn test_unknown_kind_creates_zone_without_content() {
        let mut doc = new_document("g", &HeaderConfig::default()).expect("skeleton");
        let mut ctx = ComposeContext::new("g", &mut doc);
        let mut a = annotation("a1", "x-odd", "xywh=pixel:0,0,1,1");
        a.label = Some("Odd".to_string());
        let report = merge_item(&mut ctx, &item("i1", "1", vec![a])).unwrap();
        assert_eq!(report.unrecognized, 1);
        assert_eq!(report.zones_added, 1);

        let body = tei::body(&doc).unwrap();
        let div = doc.first_child_named(body, &tei::tei("div")).expect("div");
        assert_eq!(doc.attr(div, &attr("type")), None);
        assert_eq!(doc.attr(div, &attr("ids")), Some("a1"));
        assert!(doc.first_child_named(div, &tei::tei("label")).is_none());
    }

    #[test]
    fn test_merged_entry_keeps_first_label() {
        let mut doc = new_document("g", &HeaderConfig::default()).expect("skeleton");
        let mut ctx = ComposeContext::new("g", &mut doc);
        let mut first = annotation("a1", "n-x", "xywh=pixel:0,0,1,1");
        first.label = Some("First".to_string());
        let mut second = annotation("a2", "n-x", "xywh=pixel:5,5,1,1");
        second.label = Some("Second".to_string());
        second.note = Some("Only note".to_string());
        let report = merge_item(&mut ctx, &item("i1", "1", vec![first, second])).unwrap();
        assert_eq!(report.entries_added, 1);
        assert_eq!(report.entries_merged, 1);

        let body = tei::body(&doc).unwrap();
        let div = doc.first_child_named(body, &tei::tei("div")).unwrap();
        let label = doc.first_child_named(div, &tei::tei("label")).unwrap();
        let note = doc.first_child_named(div, &tei::tei("note")).unwrap();
        assert_eq!(doc.text(label), "First");
        assert_eq!(doc.text(note), "Only note");
    }
}
