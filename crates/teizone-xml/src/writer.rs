//! XML serialization
//!
//! The root element's namespace becomes the default namespace. Every other
//! namespace used by an element or attribute is bound to a prefix declared on
//! the root. Output is indented by two spaces and starts with an XML
//! declaration. Elements that contain text are written without indentation
//! inside them, so mixed content keeps its spacing.

use crate::error::{Result, XmlError};
use crate::name::XML_NS;
use crate::tree::{Document, NodeId, NodeKind};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Conventional prefixes for namespaces that show up in TEI documents
const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("http://www.w3.org/2000/svg", "svg"),
    ("http://www.tei-c.org/ns/1.0", "tei"),
    ("http://www.w3.org/1999/xlink", "xlink"),
];

#[derive(Debug, Default)]
struct Prefixes {
    default_ns: Option<String>,
    /// namespace URI -> prefix
    bound: BTreeMap<String, String>,
}

impl Prefixes {
    fn collect(doc: &Document, root: NodeId) -> Self {
        let mut prefixes = Self {
            default_ns: doc.name(root).and_then(|n| n.ns()).map(str::to_string),
            bound: BTreeMap::new(),
        };
        for id in doc.descendants(root) {
            let Some(element) = doc.element(id) else {
                continue;
            };
            if let Some(ns) = element.name.ns() {
                if Some(ns) != prefixes.default_ns.as_deref() {
                    prefixes.bind(ns);
                }
            }
            for attr in &element.attributes {
                // namespaced attributes always need a prefix
                if let Some(ns) = attr.name.ns() {
                    if ns != XML_NS {
                        prefixes.bind(ns);
                    }
                }
            }
        }
        prefixes
    }

    fn bind(&mut self, ns: &str) {
        if self.bound.contains_key(ns) {
            return;
        }
        let taken = |p: &str, bound: &BTreeMap<String, String>| bound.values().any(|v| v == p);
        let known = KNOWN_PREFIXES
            .iter()
            .find(|(uri, _)| *uri == ns)
            .map(|(_, p)| (*p).to_string())
            .filter(|p| !taken(p, &self.bound));
        let prefix = known.unwrap_or_else(|| {
            let mut i = 0;
            loop {
                let candidate = format!("ns{i}");
                if !taken(&candidate, &self.bound) {
                    break candidate;
                }
                i += 1;
            }
        });
        self.bound.insert(ns.to_string(), prefix);
    }

    fn prefix(&self, ns: &str) -> Result<&str> {
        if ns == XML_NS {
            return Ok("xml");
        }
        self.bound
            .get(ns)
            .map(String::as_str)
            .ok_or_else(|| XmlError::InvalidStructure(format!("no prefix bound for {ns}")))
    }
}

impl Document {
    /// Serialize the document reachable from the root
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Xml` if quick-xml fails to write an event.
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let prefixes = Prefixes::collect(self, self.root());
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_indented(&mut writer, self.root(), &prefixes, None, true)?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }

    /// Serialize into a string
    ///
    /// # Errors
    ///
    /// See [`Document::write_to`].
    pub fn to_xml_string(&self) -> Result<String> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(String::from_utf8(out)?)
    }

    /// Serialize to a file, replacing it if present
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml_string()?;
        fs::write(path, xml)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn has_text(&self, id: NodeId) -> bool {
        self.children(id)
            .iter()
            .any(|&c| matches!(self.kind(c), NodeKind::Text(_)))
    }

    /// Write a node with the indenting writer; text-bearing elements go
    /// through an unindented writer
    fn write_indented<W: Write>(
        &self,
        writer: &mut Writer<W>,
        id: NodeId,
        prefixes: &Prefixes,
        current_default: Option<&str>,
        is_root: bool,
    ) -> Result<()> {
        if self.element(id).is_some() && self.has_text(id) {
            let mut raw = Writer::new(Vec::new());
            self.write_node(&mut raw, id, prefixes, current_default, is_root)?;
            writer.write_indent()?;
            writer.get_mut().write_all(&raw.into_inner())?;
            return Ok(());
        }
        self.write_node(writer, id, prefixes, current_default, is_root)
    }

    fn write_node<W: Write>(
        &self,
        writer: &mut Writer<W>,
        id: NodeId,
        prefixes: &Prefixes,
        current_default: Option<&str>,
        is_root: bool,
    ) -> Result<()> {
        match self.kind(id) {
            NodeKind::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            NodeKind::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            }
            NodeKind::Element(element) => {
                let local = element.name.local_name();
                let (tag, own_default) = match element.name.ns() {
                    Some(ns) if Some(ns) != prefixes.default_ns.as_deref() => {
                        (format!("{}:{local}", prefixes.prefix(ns)?), current_default)
                    }
                    ns => (local.to_string(), ns),
                };

                let mut start = BytesStart::new(tag.as_str());
                if own_default != current_default {
                    start.push_attribute(("xmlns", own_default.unwrap_or("")));
                }
                if is_root {
                    for (ns, prefix) in &prefixes.bound {
                        let key = format!("xmlns:{prefix}");
                        start.push_attribute((key.as_str(), ns.as_str()));
                    }
                }
                for attr in &element.attributes {
                    let key = match attr.name.ns() {
                        Some(ns) => format!("{}:{}", prefixes.prefix(ns)?, attr.name.local_name()),
                        None => attr.name.local_name().to_string(),
                    };
                    start.push_attribute((key.as_str(), attr.value.as_str()));
                }

                let children = self.children(id);
                if children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    let indented = !self.has_text(id);
                    for &child in children {
                        if indented {
                            self.write_indented(writer, child, prefixes, own_default, false)?;
                        } else {
                            self.write_node(writer, child, prefixes, own_default, false)?;
                        }
                    }
                    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }
        }
        Ok(())
    }
}
