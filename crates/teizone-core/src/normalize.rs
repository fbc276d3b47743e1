//! Facsimile re-sorting
//!
//! Documents edited by hand can drift out of order. Surfaces are re-sorted
//! by `n` under `facsimile`, and zones by `n` under each surface, keeping any
//! comment attached to the element it precedes.

use crate::error::{Result, TeiError};
use crate::tei::{self, attr};
use teizone_xml::{sort_child_elements, Document, NodeId};

fn n_key(doc: &Document, node: NodeId) -> String {
    doc.attr(node, &attr("n")).unwrap_or_default().to_string()
}

fn is_sorted(doc: &Document, parent: NodeId) -> bool {
    let keys: Vec<String> = doc.child_elements(parent).map(|c| n_key(doc, c)).collect();
    keys.windows(2).all(|w| w[0] <= w[1])
}

/// Replace `parent` with a sorted copy if out of order; returns the node now in place
fn resort(doc: &mut Document, parent: NodeId) -> Result<(NodeId, bool)> {
    if is_sorted(doc, parent) {
        return Ok((parent, false));
    }
    let sorted = sort_child_elements(doc, parent, n_key)?;
    doc.replace(parent, sorted)?;
    Ok((sorted, true))
}

/// Sort surfaces and zones by `n`
///
/// Returns the number of containers that were re-sorted.
///
/// # Errors
///
/// Returns `TeiError::InvalidState` if the document has no facsimile.
pub fn normalize_facsimile(doc: &mut Document) -> Result<usize> {
    let facsimile = tei::facsimile(doc)
        .ok_or_else(|| TeiError::InvalidState("expected facsimile element".to_string()))?;

    let mut count = 0;
    let surfaces: Vec<NodeId> = doc
        .child_elements_named(facsimile, &tei::tei("surface"))
        .collect();
    for surface in surfaces {
        let (_, changed) = resort(doc, surface)?;
        if changed {
            count += 1;
        }
    }
    let (_, changed) = resort(doc, facsimile)?;
    if changed {
        count += 1;
    }
    log::debug!("Re-sorted {count} facsimile container(s)");
    Ok(count)
}
