//! Writing shapes into a target element

use crate::error::Result;
use crate::selector::parse_selector;
use crate::shape::{format_number, Shape};
use teizone_xml::{Document, NodeId, QName};

/// SVG namespace
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Geometry attributes owned by the converter on the target element
const GEOMETRY_ATTRS: [&str; 5] = ["ulx", "uly", "lrx", "lry", "points"];

/// Build a detached `svg:svg` element wrapping the shape
///
/// # Errors
///
/// Returns `SelectorError::Xml` if the shape cannot be attached.
pub fn shape_markup(doc: &mut Document, shape: &Shape) -> Result<NodeId> {
    let svg = doc.create_element(QName::new(SVG_NS, "svg"));
    let element = doc.create_element(QName::new(SVG_NS, shape.tag_name()));
    for (key, value) in shape.svg_attributes() {
        doc.set_attr(element, QName::local(key), value);
    }
    doc.append_child(svg, element)?;
    Ok(svg)
}

/// Convert `selector` and attach its geometry to `target`
///
/// Sets `ulx`/`uly`/`lrx`/`lry` for shapes with a bounding box, `points` for
/// polygons, and appends the shape as `svg:svg` markup. Geometry from an
/// earlier conversion is replaced, so repeated calls leave one `svg:svg`
/// child. On error the target is unchanged.
///
/// # Errors
///
/// Returns `SelectorError::InvalidSelector` if the selector is not
/// recognized, or `SelectorError::Xml` if the markup cannot be attached.
pub fn apply_selector(doc: &mut Document, target: NodeId, selector: &str) -> Result<Shape> {
    let shape = parse_selector(selector)?;

    for key in GEOMETRY_ATTRS {
        doc.remove_attr(target, &QName::local(key));
    }
    let svg_name = QName::new(SVG_NS, "svg");
    let stale: Vec<NodeId> = doc.child_elements_named(target, &svg_name).collect();
    for node in stale {
        doc.detach(node);
    }

    if let Some(bbox) = shape.bounding_box() {
        doc.set_attr(target, QName::local("ulx"), format_number(bbox.ulx));
        doc.set_attr(target, QName::local("uly"), format_number(bbox.uly));
        doc.set_attr(target, QName::local("lrx"), format_number(bbox.lrx));
        doc.set_attr(target, QName::local("lry"), format_number(bbox.lry));
    }
    if let Shape::Polygon { points } = &shape {
        doc.set_attr(target, QName::local("points"), points.as_str());
    }

    let svg = shape_markup(doc, &shape)?;
    doc.append_child(target, svg)?;
    Ok(shape)
}
