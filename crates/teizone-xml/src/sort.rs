//! Comment-preserving child sort

use crate::error::Result;
use crate::tree::{Document, NodeId, NodeKind};

/// Nearest comment immediately preceding `element`, skipping whitespace text
fn leading_comment(doc: &Document, element: NodeId) -> Option<NodeId> {
    let mut current = doc.previous_sibling(element);
    while let Some(id) = current {
        match doc.kind(id) {
            NodeKind::Comment(_) => return Some(id),
            NodeKind::Text(t) if t.trim().is_empty() => current = doc.previous_sibling(id),
            _ => return None,
        }
    }
    None
}

/// Sort the child elements of `parent` by `key`, keeping comments attached
///
/// Each child element is paired with the comment right before it (whitespace
/// text in between is ignored). Pairs are stable-sorted by key in byte order
/// and deep-copied into a new detached element with the same name and
/// attributes as `parent`, which is returned. `parent` is left untouched.
/// Comments that do not precede an element and non-whitespace text are not
/// carried over.
///
/// # Errors
///
/// Returns `XmlError::InvalidArgument` if a copy cannot be attached.
pub fn sort_child_elements<F>(doc: &mut Document, parent: NodeId, mut key: F) -> Result<NodeId>
where
    F: FnMut(&Document, NodeId) -> String,
{
    let view: &Document = doc;
    let mut pairs: Vec<(String, NodeId, Option<NodeId>)> = view
        .child_elements(parent)
        .map(|child| (key(view, child), child, leading_comment(view, child)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let shell = doc.element(parent).cloned().unwrap_or_default();
    let sorted = doc.create_element(shell.name.clone());
    if let Some(target) = doc.element_mut(sorted) {
        target.attributes = shell.attributes;
    }

    for (_, element, comment) in pairs {
        if let Some(comment) = comment {
            let copy = doc.deep_copy(comment);
            doc.append_child(sorted, copy)?;
        }
        let copy = doc.deep_copy(element);
        doc.append_child(sorted, copy)?;
    }
    Ok(sorted)
}
