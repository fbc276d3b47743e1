//! XML loading
//!
//! Parses markup into a [`Document`] with quick-xml, resolving namespace
//! prefixes into expanded names. Text is kept as read, except for line
//! indentation in element-only content: whitespace runs holding a line break
//! are dropped from elements that have no other text. Comments inside the
//! root element are kept as nodes.

use crate::error::{Result, XmlError};
use crate::name::{QName, XML_NS};
use crate::tree::{Document, NodeId, NodeKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Stack of in-scope namespace declarations (prefix `""` is the default)
#[derive(Debug, Default)]
struct NsScope {
    frames: Vec<HashMap<String, String>>,
}

impl NsScope {
    fn push(&mut self, frame: HashMap<String, String>) {
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolve a prefix; an empty URI undeclares the default namespace
    fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(prefix))
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }
}

#[inline]
fn split_prefix(raw: &str) -> (&str, &str) {
    raw.split_once(':').unwrap_or(("", raw))
}

fn resolve_prefixed(scope: &NsScope, prefix: &str) -> Result<String> {
    scope
        .resolve(prefix)
        .map(str::to_string)
        .ok_or_else(|| XmlError::InvalidStructure(format!("unbound namespace prefix: {prefix}")))
}

/// Create the element for a start tag and push its namespace frame
fn open_element(doc: &mut Document, scope: &mut NsScope, e: &BytesStart<'_>) -> Result<NodeId> {
    let mut frame = HashMap::new();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            frame.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            frame.insert(prefix.to_string(), value);
        } else {
            attrs.push((key, value));
        }
    }
    scope.push(frame);

    let raw_name = String::from_utf8(e.name().as_ref().to_vec())?;
    let (prefix, local) = split_prefix(&raw_name);
    let name = if prefix.is_empty() {
        QName::with_ns(scope.resolve(""), local)
    } else {
        QName::new(&resolve_prefixed(scope, prefix)?, local)
    };
    let id = doc.create_element(name);

    for (key, value) in attrs {
        let (prefix, local) = split_prefix(&key);
        // unprefixed attributes are in no namespace
        let name = if prefix.is_empty() {
            QName::local(local)
        } else {
            QName::new(&resolve_prefixed(scope, prefix)?, local)
        };
        doc.set_attr(id, name, value);
    }
    Ok(id)
}

fn is_layout_text(doc: &Document, id: NodeId) -> bool {
    matches!(doc.kind(id), NodeKind::Text(t) if t.contains('\n') && t.trim().is_empty())
}

/// Remove indentation text from element-only content
fn drop_layout_whitespace(doc: &mut Document) {
    for id in doc.descendants(doc.root()) {
        let children = doc.children(id);
        let mixed = children
            .iter()
            .any(|&c| matches!(doc.kind(c), NodeKind::Text(_)) && !is_layout_text(doc, c));
        if mixed {
            continue;
        }
        let blanks: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&c| is_layout_text(doc, c))
            .collect();
        for blank in blanks {
            doc.detach(blank);
        }
    }
}

impl Document {
    /// Parse a document from a string
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The content is not well-formed XML (`XmlError::Xml`, `XmlError::Attr`)
    /// - A namespace prefix is unbound or there is not exactly one root
    ///   element (`XmlError::InvalidStructure`)
    pub fn parse_str(content: &str) -> Result<Self> {
        // temporary holder for the top level; replaced by the real root below
        let mut doc = Self::new(QName::local("#document"));
        let holder = doc.root();
        let mut stack = vec![holder];
        let mut scope = NsScope::default();

        let mut reader = Reader::from_str(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let id = open_element(&mut doc, &mut scope, &e)?;
                    let parent = stack.last().copied().unwrap_or(holder);
                    doc.append_child(parent, id)?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    let id = open_element(&mut doc, &mut scope, &e)?;
                    let parent = stack.last().copied().unwrap_or(holder);
                    doc.append_child(parent, id)?;
                    scope.pop();
                }
                Ok(Event::End(_)) => {
                    if stack.len() <= 1 {
                        return Err(XmlError::InvalidStructure(
                            "unexpected closing tag".to_string(),
                        ));
                    }
                    stack.pop();
                    scope.pop();
                }
                Ok(Event::Text(e)) => {
                    if stack.len() > 1 {
                        let text = e.unescape()?.into_owned();
                        let id = doc.create_text(text);
                        let parent = stack.last().copied().unwrap_or(holder);
                        doc.append_child(parent, id)?;
                    }
                }
                Ok(Event::CData(e)) => {
                    if stack.len() > 1 {
                        let id = doc.create_text(String::from_utf8_lossy(&e).into_owned());
                        let parent = stack.last().copied().unwrap_or(holder);
                        doc.append_child(parent, id)?;
                    }
                }
                Ok(Event::Comment(e)) => {
                    // comments outside the root element are not retained
                    if stack.len() > 1 {
                        let id = doc.create_comment(String::from_utf8_lossy(&e).into_owned());
                        let parent = stack.last().copied().unwrap_or(holder);
                        doc.append_child(parent, id)?;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("XML parse error at position {}: {e}", reader.buffer_position());
                    return Err(XmlError::Xml(e));
                }
                Ok(_) => {}
            }
            buf.clear();
        }

        if stack.len() > 1 {
            return Err(XmlError::InvalidStructure(
                "unclosed element at end of input".to_string(),
            ));
        }
        let roots: Vec<NodeId> = doc.child_elements(holder).collect();
        match roots.as_slice() {
            [root] => {
                doc.promote_to_root(*root);
                drop_layout_whitespace(&mut doc);
                Ok(doc)
            }
            [] => Err(XmlError::InvalidStructure("no root element".to_string())),
            _ => Err(XmlError::InvalidStructure(
                "more than one root element".to_string(),
            )),
        }
    }

    /// Load a document from a file
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if the file cannot be read, or any error of
    /// [`Document::parse_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    const TEI: &str = "http://www.tei-c.org/ns/1.0";

    #[test]
    fn test_parse_resolves_default_and_prefixed_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:svg="http://www.w3.org/2000/svg">
  <facsimile>
    <surface xml:id="s1" n="g/1">
      <zone><svg:svg><svg:circle cx="1" cy="2" r="3"/></svg:svg></zone>
    </surface>
  </facsimile>
</TEI>"#;
        let doc = Document::parse_str(xml).expect("Failed to parse TEI");
        let root = doc.root();
        assert_eq!(doc.name(root), Some(&QName::new(TEI, "TEI")));

        let facsimile = doc
            .first_child_named(root, &QName::new(TEI, "facsimile"))
            .expect("facsimile");
        let surface = doc
            .first_child_named(facsimile, &QName::new(TEI, "surface"))
            .expect("surface");
        assert_eq!(doc.attr(surface, &QName::xml("id")), Some("s1"));
        assert_eq!(doc.attr(surface, &QName::local("n")), Some("g/1"));

        let zone = doc.child_elements(surface).next().expect("zone");
        let svg = doc.child_elements(zone).next().expect("svg");
        assert_eq!(
            doc.name(svg),
            Some(&QName::new("http://www.w3.org/2000/svg", "svg"))
        );
    }

    #[test]
    fn test_parse_keeps_comments_and_text() {
        let xml = "<parent><!--note--><child>a &amp; b</child></parent>";
        let doc = Document::parse_str(xml).unwrap();
        let children = doc.children(doc.root());
        assert_eq!(children.len(), 2);
        assert_eq!(doc.kind(children[0]), &NodeKind::Comment("note".to_string()));
        assert_eq!(doc.text(children[1]), "a & b");
    }

    #[test]
    fn test_parse_keeps_spaces_in_mixed_content() {
        let xml = "<div>\n  <p>Edited by <hi>Jane</hi> and others</p>\n  <p><hi>A</hi> <hi>B</hi></p>\n</div>";
        let doc = Document::parse_str(xml).expect("parse");
        let root = doc.root();
        // indentation between the paragraphs is not content
        assert_eq!(doc.children(root).len(), 2);

        let paragraphs: Vec<NodeId> = doc.child_elements(root).collect();
        assert_eq!(doc.text(paragraphs[0]), "Edited by Jane and others");
        assert_eq!(doc.children(paragraphs[1]).len(), 3);
        assert_eq!(doc.text(paragraphs[1]), "A B");
    }

    #[test]
    fn test_parse_rejects_unbound_prefix() {
        let err = Document::parse_str("<a><x:b/></a>").unwrap_err();
        assert!(matches!(err, XmlError::InvalidStructure(_)));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(Document::parse_str("").is_err());
    }

    #[test]
    fn test_parse_undeclared_default_namespace() {
        let xml = r#"<a xmlns="urn:x"><b xmlns=""><c/></b></a>"#;
        let doc = Document::parse_str(xml).unwrap();
        let b = doc.child_elements(doc.root()).next().unwrap();
        let c = doc.child_elements(b).next().unwrap();
        assert_eq!(doc.name(b), Some(&QName::local("b")));
        assert_eq!(doc.name(c), Some(&QName::local("c")));
    }
}
