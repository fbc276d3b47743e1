//! Region selectors to TEI zone geometry
//!
//! This crate converts free-form region selectors into normalized bounding
//! boxes and canonical SVG shape markup attached to a zone element.
//!
//! ## Supported Selectors
//!
//! - **Rectangle** - `xywh=pixel:X,Y,W,H` (bare `xywh=` is read as pixels)
//! - **Polygon** - `<svg><polygon points="x,y x,y ..."/></svg>`, points kept verbatim
//! - **Circle** - `<svg><circle cx cy r/></svg>`
//! - **Ellipse** - `<svg><ellipse cx cy rx ry/></svg>`
//! - **Path** - `<svg><path d="..."/></svg>`, markup only
//!
//! ## Examples
//!
//! ```rust
//! use teizone_svg::parse_selector;
//!
//! let shape = parse_selector("xywh=pixel:10,20,300,400")?;
//! let bbox = shape.bounding_box().expect("rectangles have a box");
//! assert_eq!(bbox.lrx, 310.0);
//! # Ok::<(), teizone_svg::SelectorError>(())
//! ```

pub mod error;
pub mod markup;
pub mod selector;
pub mod shape;

// Re-export main types
pub use error::{Result, SelectorError};
pub use markup::{apply_selector, shape_markup, SVG_NS};
pub use selector::parse_selector;
pub use shape::{format_number, BoundingBox, Shape};
