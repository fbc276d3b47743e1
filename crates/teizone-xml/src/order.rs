//! Ordered insertion among sibling elements

use crate::error::{Result, XmlError};
use crate::name::QName;
use crate::tree::{Document, NodeId};

/// Insert `child` under `parent` ordered by the string value of `sort_attr`
///
/// Only siblings with the same element name as `child` are compared. The
/// search window excludes everything up to and including `lower` and stops at
/// `upper`. `child` goes before the first sibling in the window whose value is
/// strictly greater (byte order, a missing attribute counts as empty); if none
/// is found it goes before `upper`, or at the end when `upper` is `None`.
/// An attached `child` is detached first.
///
/// # Errors
///
/// Returns `XmlError::InvalidArgument` if `child` is not an element or an
/// anchor is not a child of `parent`.
pub fn insert_in_order(
    doc: &mut Document,
    parent: NodeId,
    child: NodeId,
    sort_attr: &QName,
    lower: Option<NodeId>,
    upper: Option<NodeId>,
) -> Result<()> {
    let Some(name) = doc.name(child).cloned() else {
        return Err(XmlError::InvalidArgument(
            "only elements can be inserted in order".to_string(),
        ));
    };
    for anchor in [lower, upper].into_iter().flatten() {
        if anchor == child || doc.parent(anchor) != Some(parent) {
            return Err(XmlError::InvalidArgument(
                "ordering anchor is not a child of the target parent".to_string(),
            ));
        }
    }
    doc.detach(child);

    let value = doc.attr(child, sort_attr).unwrap_or_default().to_string();
    let siblings = doc.children(parent).to_vec();
    let start = match lower {
        Some(l) => siblings.iter().position(|&s| s == l).map_or(0, |i| i + 1),
        None => 0,
    };

    let mut before = None;
    for &sibling in &siblings[start..] {
        if Some(sibling) == upper {
            break;
        }
        if !doc.is_named(sibling, &name) {
            continue;
        }
        if doc.attr(sibling, sort_attr).unwrap_or_default() > value.as_str() {
            before = Some(sibling);
            break;
        }
    }

    match before.or(upper) {
        Some(reference) => doc.insert_before(reference, child),
        None => doc.append_child(parent, child),
    }
}
