//! Selector parsing
//!
//! Two selector families are recognized: W3C media-fragment rectangles
//! (`xywh=pixel:X,Y,W,H`) and inline SVG holding a single shape element
//! (`<svg><circle .../></svg>`).

use crate::error::{Result, SelectorError};
use crate::shape::Shape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

const PIXEL_PREFIX: &str = "xywh=pixel:";
const XYWH_PREFIX: &str = "xywh=";

/// Helper struct for attribute parsing
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMap {
    attrs: HashMap<String, String>,
}

impl AttrMap {
    #[inline]
    fn from_event(e: &BytesStart<'_>) -> Self {
        let mut attrs = HashMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).to_string(),
                |v| v.to_string(),
            );
            attrs.insert(key, value);
        }
        Self { attrs }
    }

    #[inline]
    fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    fn require(&self, key: &str, tag: &str) -> Result<&str> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SelectorError::InvalidSelector(format!("{tag} without {key}")))
    }

    fn require_f64(&self, key: &str, tag: &str) -> Result<f64> {
        let raw = self.require(key, tag)?;
        parse_number(raw)
            .ok_or_else(|| SelectorError::InvalidSelector(format!("{tag} {key} is not a number: {raw}")))
    }
}

#[inline]
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a region selector into a shape
///
/// # Errors
///
/// Returns `SelectorError::InvalidSelector` if the selector is not a
/// four-value `xywh=` rectangle or an `<svg>` wrapper around a `rect`,
/// `polygon`, `circle`, `ellipse` or `path` with valid attributes.
pub fn parse_selector(selector: &str) -> Result<Shape> {
    let selector = selector.trim();
    if let Some(csv) = selector
        .strip_prefix(PIXEL_PREFIX)
        .or_else(|| selector.strip_prefix(XYWH_PREFIX))
    {
        return parse_xywh(csv, selector);
    }
    if selector.starts_with("<svg") {
        return parse_svg_selector(selector);
    }
    Err(SelectorError::InvalidSelector(selector.to_string()))
}

fn parse_xywh(csv: &str, selector: &str) -> Result<Shape> {
    if csv.starts_with("percent:") {
        return Err(SelectorError::InvalidSelector(format!(
            "percent units are not supported: {selector}"
        )));
    }
    let values: Vec<f64> = csv
        .split(',')
        .map(parse_number)
        .collect::<Option<_>>()
        .ok_or_else(|| SelectorError::InvalidSelector(selector.to_string()))?;
    match values.as_slice() {
        &[x, y, width, height] => Ok(Shape::Rect {
            x,
            y,
            width,
            height,
        }),
        _ => Err(SelectorError::InvalidSelector(selector.to_string())),
    }
}

/// Find the first element inside the outer `<svg>` wrapper
fn parse_svg_selector(selector: &str) -> Result<Shape> {
    let mut reader = Reader::from_str(selector);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut in_svg = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if !in_svg {
                    if tag != "svg" {
                        break;
                    }
                    in_svg = true;
                } else {
                    let attrs = AttrMap::from_event(&e);
                    return parse_shape(&tag, &attrs, selector);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("Malformed SVG selector {selector}: {e}");
                return Err(SelectorError::InvalidSelector(format!("{selector}: {e}")));
            }
            Ok(_) => {}
        }
        buf.clear();
    }
    Err(SelectorError::InvalidSelector(selector.to_string()))
}

fn parse_shape(tag: &str, attrs: &AttrMap, selector: &str) -> Result<Shape> {
    match tag {
        "rect" => Ok(Shape::Rect {
            x: attrs.require_f64("x", tag)?,
            y: attrs.require_f64("y", tag)?,
            width: attrs.require_f64("width", tag)?,
            height: attrs.require_f64("height", tag)?,
        }),
        "polygon" => {
            let points = attrs.require("points", tag)?;
            if !valid_points(points) {
                return Err(SelectorError::InvalidSelector(format!(
                    "polygon points are malformed: {points}"
                )));
            }
            Ok(Shape::Polygon {
                points: points.to_string(),
            })
        }
        "circle" => Ok(Shape::Circle {
            cx: attrs.require_f64("cx", tag)?,
            cy: attrs.require_f64("cy", tag)?,
            r: attrs.require_f64("r", tag)?,
        }),
        "ellipse" => Ok(Shape::Ellipse {
            cx: attrs.require_f64("cx", tag)?,
            cy: attrs.require_f64("cy", tag)?,
            rx: attrs.require_f64("rx", tag)?,
            ry: attrs.require_f64("ry", tag)?,
        }),
        "path" => Ok(Shape::Path {
            d: attrs.require("d", tag)?.to_string(),
        }),
        _ => Err(SelectorError::InvalidSelector(format!(
            "unsupported shape {tag}: {selector}"
        ))),
    }
}

/// Points must be whitespace-separated `x,y` pairs
fn valid_points(points: &str) -> bool {
    let mut count = 0;
    for pair in points.split_whitespace() {
        let Some((x, y)) = pair.split_once(',') else {
            return false;
        };
        if parse_number(x).is_none() || parse_number(y).is_none() {
            return false;
        }
        count += 1;
    }
    count > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pixel_rect() {
        let shape = parse_selector("xywh=pixel:10,20,300,400").expect("Failed to parse rect");
        assert_eq!(
            shape,
            Shape::Rect {
                x: 10.0,
                y: 20.0,
                width: 300.0,
                height: 400.0
            }
        );
    }

    #[test]
    fn test_parse_bare_xywh_defaults_to_pixels() {
        let shape = parse_selector("xywh=1.5,2,3,4").unwrap();
        assert!(matches!(shape, Shape::Rect { x, .. } if (x - 1.5).abs() < f64::EPSILON));
    }

    #[test]
    fn test_parse_rect_wrong_arity() {
        assert!(parse_selector("xywh=pixel:10,20,300").is_err());
        assert!(parse_selector("xywh=pixel:10,20,300,400,5").is_err());
        assert!(parse_selector("xywh=pixel:a,b,c,d").is_err());
        assert!(parse_selector("xywh=percent:10,10,50,50").is_err());
    }

    #[test]
    fn test_parse_svg_shapes() {
        let circle = parse_selector(r#"<svg><circle cx="364.5" cy="461" r="141.2"></circle></svg>"#)
            .expect("Failed to parse circle");
        assert_eq!(
            circle,
            Shape::Circle {
                cx: 364.5,
                cy: 461.0,
                r: 141.2
            }
        );

        let polygon = parse_selector(
            r#"<svg><polygon points="269,389 246,467 368,529 439,413 372,379"></polygon></svg>"#,
        )
        .unwrap();
        assert_eq!(
            polygon,
            Shape::Polygon {
                points: "269,389 246,467 368,529 439,413 372,379".to_string()
            }
        );

        let path = parse_selector(r#"<svg><path d="M381 44 L381 45"/></svg>"#).unwrap();
        assert_eq!(
            path,
            Shape::Path {
                d: "M381 44 L381 45".to_string()
            }
        );
    }

    #[test]
    fn test_parse_svg_rejects_unknown_and_incomplete() {
        assert!(parse_selector(r#"<svg><line x1="0" y1="0" x2="1" y2="1"/></svg>"#).is_err());
        assert!(parse_selector(r#"<svg><circle cx="1" cy="2"/></svg>"#).is_err());
        assert!(parse_selector(r#"<svg><polygon points="1,2 3"/></svg>"#).is_err());
        assert!(parse_selector("<svg></svg>").is_err());
        assert!(parse_selector("<svg><circle").is_err());
        assert!(parse_selector("").is_err());
        assert!(parse_selector("rect:1,2,3,4").is_err());
    }
}
