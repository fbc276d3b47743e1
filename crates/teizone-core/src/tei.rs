//! TEI vocabulary and document skeleton

use crate::config::HeaderConfig;
use crate::error::Result;
use teizone_xml::{Document, NodeId, QName};

/// TEI namespace
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// Name of a TEI element
#[inline]
#[must_use]
pub fn tei(local: &str) -> QName {
    QName::new(TEI_NS, local)
}

/// Name of an unqualified attribute
#[inline]
#[must_use]
pub fn attr(local: &str) -> QName {
    QName::local(local)
}

/// `xml:id`
#[inline]
#[must_use]
pub fn xml_id() -> QName {
    QName::xml("id")
}

fn child(doc: &mut Document, parent: NodeId, local: &str) -> Result<NodeId> {
    let id = doc.create_element(tei(local));
    doc.append_child(parent, id)?;
    Ok(id)
}

fn text_child(doc: &mut Document, parent: NodeId, local: &str, text: &str) -> Result<NodeId> {
    let id = child(doc, parent, local)?;
    doc.set_text(id, text);
    Ok(id)
}

/// Create an empty TEI document for a group
///
/// The document holds `teiHeader/fileDesc/titleStmt`, an empty `facsimile`
/// and `text/body`.
///
/// # Errors
///
/// Returns `TeiError::Xml` if an element cannot be attached.
pub fn new_document(group_id: &str, header: &HeaderConfig) -> Result<Document> {
    let mut doc = Document::new(tei("TEI"));
    let root = doc.root();

    let tei_header = child(&mut doc, root, "teiHeader")?;
    let file_desc = child(&mut doc, tei_header, "fileDesc")?;
    let title_stmt = child(&mut doc, file_desc, "titleStmt")?;
    let main = text_child(&mut doc, title_stmt, "title", &header.title)?;
    doc.set_attr(main, attr("type"), "main");
    let sub = text_child(&mut doc, title_stmt, "title", &header.subtitle(group_id))?;
    doc.set_attr(sub, attr("type"), "sub");
    let author = text_child(&mut doc, title_stmt, "author", &header.author)?;
    text_child(&mut doc, author, "ex", &header.author_ex)?;
    let resp_stmt = child(&mut doc, title_stmt, "respStmt")?;
    text_child(&mut doc, resp_stmt, "resp", &header.resp)?;

    child(&mut doc, root, "facsimile")?;
    let text = child(&mut doc, root, "text")?;
    child(&mut doc, text, "body")?;
    Ok(doc)
}

/// The `facsimile` element under the root
#[must_use]
pub fn facsimile(doc: &Document) -> Option<NodeId> {
    doc.first_child_named(doc.root(), &tei("facsimile"))
}

/// The `text/body` element
#[must_use]
pub fn body(doc: &Document) -> Option<NodeId> {
    let text = doc.first_child_named(doc.root(), &tei("text"))?;
    doc.first_child_named(text, &tei("body"))
}

/// First child element with the given name and attribute value
#[must_use]
pub fn find_child_by_attr(
    doc: &Document,
    parent: NodeId,
    name: &QName,
    key: &QName,
    value: &str,
) -> Option<NodeId> {
    doc.child_elements_named(parent, name)
        .find(|&c| doc.attr(c, key) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_skeleton() {
        let doc = new_document("ccc-ms029", &HeaderConfig::default()).expect("skeleton");
        let root = doc.root();
        assert_eq!(doc.name(root), Some(&tei("TEI")));
        assert!(doc.first_child_named(root, &tei("teiHeader")).is_some());
        assert!(facsimile(&doc).is_some());
        assert!(body(&doc).is_some());

        let xml = doc.to_xml_string().expect("serialize");
        assert!(xml.contains(r#"<title type="main">Compendium Historiae in genealogia Christi</title>"#));
        assert!(xml.contains("the manuscript ccc-ms029</title>"));
        assert!(xml.contains("<ex>Petrus Pictaviensis</ex>"));
        assert!(xml.contains("<facsimile/>"));
    }

    #[test]
    fn test_body_missing_text() {
        let doc = Document::new(tei("TEI"));
        assert!(body(&doc).is_none());
        assert!(facsimile(&doc).is_none());
    }
}
