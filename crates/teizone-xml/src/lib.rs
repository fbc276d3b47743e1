//! Mutable XML tree for incremental TEI editing
//!
//! This crate provides a small namespace-aware XML tree that can be loaded,
//! edited in place and written back, plus the two ordering utilities the TEI
//! composer is built on.
//!
//! ## Features
//!
//! - **Arena tree** - [`Document`] addresses nodes by [`NodeId`]; elements,
//!   text and comments
//! - **Namespaces** - names are expanded ([`QName`]); prefixes are resolved on
//!   load and assigned on write
//! - **Ordered insertion** - [`insert_in_order`] places an element among its
//!   same-name siblings by an attribute value, optionally between two anchors
//! - **Comment-preserving sort** - [`sort_child_elements`] reorders children
//!   without separating comments from the element they describe
//!
//! ## Examples
//!
//! ```rust
//! use teizone_xml::{insert_in_order, Document, QName};
//!
//! let mut doc = Document::parse_str(r#"<surface><zone n="b"/></surface>"#)?;
//! let zone = doc.create_element(QName::local("zone"));
//! doc.set_attr(zone, QName::local("n"), "a");
//! let root = doc.root();
//! insert_in_order(&mut doc, root, zone, &QName::local("n"), None, None)?;
//! assert_eq!(doc.child_elements(root).next(), Some(zone));
//! # Ok::<(), teizone_xml::XmlError>(())
//! ```

pub mod error;
pub mod name;
pub mod order;
pub mod reader;
pub mod sort;
pub mod tree;
pub mod writer;

pub use error::{Result, XmlError};
pub use name::{QName, XMLNS_NS, XML_NS};
pub use order::insert_in_order;
pub use sort::sort_child_elements;
pub use tree::{Attribute, Document, Element, NodeId, NodeKind};
