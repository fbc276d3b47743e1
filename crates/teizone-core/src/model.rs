//! Item and annotation data model
//!
//! Items are the unit of composition: one item describes one image (page) of
//! a group (manuscript) and carries its annotations in an
//! `image-annotations` part. All types serialize as camelCase JSON.

use serde::{Deserialize, Serialize};

/// Flag set on items created by the TEI importer
pub const FLAG_IMPORTED: u32 = 1;

/// The image (page) a set of annotations refers to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetImage {
    /// Image identifier, unique within its group
    pub id: String,
    /// Image source URI
    pub uri: String,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A semantic region on one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Globally unique id, possibly with a leading `#`
    pub id: String,
    /// Entity id; its first character selects the entry type
    pub eid: String,
    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Region selector (`xywh=pixel:...` or inline SVG)
    pub selector: String,
    /// Annotated image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetImage>,
}

/// Annotation collection for one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotationsPart {
    /// The page image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TargetImage>,
    /// Annotations on the image
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ImageAnnotationsPart {
    /// The part's image, falling back to the first annotation target
    #[must_use]
    pub fn target_image(&self) -> Option<&TargetImage> {
        self.image
            .as_ref()
            .or_else(|| self.annotations.iter().find_map(|a| a.target.as_ref()))
    }
}

/// A typed item part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    /// Image annotations
    #[serde(rename = "image-annotations")]
    ImageAnnotations(ImageAnnotationsPart),
    /// Any part type the composer does not handle
    #[serde(other)]
    Other,
}

/// A composable item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item id
    pub id: String,
    /// Group (manuscript) id
    #[serde(default)]
    pub group_id: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Item flags
    #[serde(default)]
    pub flags: u32,
    /// Item parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Item {
    /// The first image-annotations part, if any
    #[must_use]
    pub fn annotations_part(&self) -> Option<&ImageAnnotationsPart> {
        self.parts.iter().find_map(|p| match p {
            Part::ImageAnnotations(part) => Some(part),
            Part::Other => None,
        })
    }
}
