//! Incremental TEI composition from image annotations
//!
//! teizone merges annotated page images into one TEI document per group
//! (manuscript). Each page becomes a `facsimile/surface` with one `zone` per
//! annotated region, and a `pb` in `text/body` followed by one `div` entry per
//! annotated entity. Runs are incremental: composing an item again updates
//! its nodes in place instead of duplicating them.
//!
//! ## Modules
//!
//! - [`composer`] - merge of a single item into a document
//! - [`store`] - per-group document stores and the [`ItemComposer`] session
//! - [`ids`] - canonical keys and suffix disambiguation
//! - [`import`] - items from existing TEI facsimiles
//! - [`normalize`] - re-sorting of surfaces and zones
//!
//! ## Examples
//!
//! ```rust
//! use teizone_core::{ItemComposer, MemoryDocumentStore, Item};
//!
//! let item: Item = serde_json::from_str(r##"{
//!     "id": "p1", "groupId": "ms1",
//!     "parts": [{
//!         "type": "image-annotations",
//!         "image": {"id": "1r", "uri": "http://img.org/1r.jpg"},
//!         "annotations": [{"id": "#a1", "eid": "n-aaron", "label": "Aaron",
//!                          "selector": "xywh=pixel:100,50,130,70"}]
//!     }]
//! }"##)?;
//!
//! let mut composer = ItemComposer::new(MemoryDocumentStore::default());
//! composer.compose(&item)?;
//! composer.close()?;
//! let xml = composer.store().get("ms1").expect("saved").to_xml_string()?;
//! assert!(xml.contains("<label>Aaron</label>"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod composer;
pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod import;
pub mod model;
pub mod normalize;
pub mod store;
pub mod tei;
pub mod tokens;

pub use composer::{merge_item, ComposeContext, ComposeReport};
pub use config::HeaderConfig;
pub use entity::EntityKind;
pub use error::{Result, TeiError};
pub use ids::{annotation_key, build_ids, image_key, shares_entry};
pub use import::TeiItemImporter;
pub use model::{Annotation, ImageAnnotationsPart, Item, Part, TargetImage, FLAG_IMPORTED};
pub use normalize::normalize_facsimile;
pub use store::{DocumentStore, FsDocumentStore, ItemComposer, MemoryDocumentStore};
pub use tei::{new_document, TEI_NS};
