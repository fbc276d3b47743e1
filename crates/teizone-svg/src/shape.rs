//! Region shapes and their bounding boxes

/// Axis-aligned bounding box in image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Upper-left X
    pub ulx: f64,
    /// Upper-left Y
    pub uly: f64,
    /// Lower-right X
    pub lrx: f64,
    /// Lower-right Y
    pub lry: f64,
}

impl BoundingBox {
    /// Bounding box of an ellipse (a circle has `rx == ry`)
    #[inline]
    #[must_use]
    pub fn around(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self {
            ulx: cx - rx,
            uly: cy - ry,
            lrx: cx + rx,
            lry: cy + ry,
        }
    }
}

/// A region shape parsed from a selector
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Pixel rectangle
    Rect {
        /// Left X coordinate
        x: f64,
        /// Top Y coordinate
        y: f64,
        /// Rectangle width
        width: f64,
        /// Rectangle height
        height: f64,
    },
    /// Polygon; points are kept exactly as given
    Polygon {
        /// Space-separated `x,y` pairs
        points: String,
    },
    /// Circle
    Circle {
        /// Center X coordinate
        cx: f64,
        /// Center Y coordinate
        cy: f64,
        /// Radius
        r: f64,
    },
    /// Ellipse
    Ellipse {
        /// Center X coordinate
        cx: f64,
        /// Center Y coordinate
        cy: f64,
        /// Horizontal radius
        rx: f64,
        /// Vertical radius
        ry: f64,
    },
    /// Freehand path
    Path {
        /// Raw path data
        d: String,
    },
}

impl Shape {
    /// Bounding box, if one is computed for this shape
    ///
    /// Polygons carry their points instead, and paths have no box.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => Some(BoundingBox {
                ulx: *x,
                uly: *y,
                lrx: x + width,
                lry: y + height,
            }),
            Self::Circle { cx, cy, r } => Some(BoundingBox::around(*cx, *cy, *r, *r)),
            Self::Ellipse { cx, cy, rx, ry } => Some(BoundingBox::around(*cx, *cy, *rx, *ry)),
            Self::Polygon { .. } | Self::Path { .. } => None,
        }
    }

    /// SVG element name of the shape
    #[inline]
    #[must_use]
    pub const fn tag_name(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Polygon { .. } => "polygon",
            Self::Circle { .. } => "circle",
            Self::Ellipse { .. } => "ellipse",
            Self::Path { .. } => "path",
        }
    }

    /// SVG attributes of the shape, formatted for output
    #[must_use]
    pub fn svg_attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => vec![
                ("x", format_number(*x)),
                ("y", format_number(*y)),
                ("width", format_number(*width)),
                ("height", format_number(*height)),
            ],
            Self::Polygon { points } => vec![("points", points.clone())],
            Self::Circle { cx, cy, r } => vec![
                ("cx", format_number(*cx)),
                ("cy", format_number(*cy)),
                ("r", format_number(*r)),
            ],
            Self::Ellipse { cx, cy, rx, ry } => vec![
                ("cx", format_number(*cx)),
                ("cy", format_number(*cy)),
                ("rx", format_number(*rx)),
                ("ry", format_number(*ry)),
            ],
            Self::Path { d } => vec![("d", d.clone())],
        }
    }
}

/// Shortest locale-independent decimal form (`10`, `364.5`)
#[inline]
#[must_use]
pub fn format_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounding_box() {
        let rect = Shape::Rect {
            x: 10.0,
            y: 20.0,
            width: 300.0,
            height: 400.0,
        };
        let bbox = rect.bounding_box().expect("rect has a box");
        assert_eq!((bbox.ulx, bbox.uly, bbox.lrx, bbox.lry), (10.0, 20.0, 310.0, 420.0));
    }

    #[test]
    fn test_polygon_and_path_have_no_box() {
        let polygon = Shape::Polygon {
            points: "0,0 1,1".to_string(),
        };
        assert!(polygon.bounding_box().is_none());
        assert!(Shape::Path { d: "M0 0".to_string() }.bounding_box().is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(364.5), "364.5");
        assert_eq!(format_number(-3.25), "-3.25");
    }
}
