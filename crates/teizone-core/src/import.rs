//! Items from existing TEI facsimiles
//!
//! Reads the `facsimile/surface` elements of a TEI document back into items,
//! one per surface, so that a store can be seeded from documents produced
//! elsewhere (or by a previous composition).

use crate::error::{Result, TeiError};
use crate::model::{ImageAnnotationsPart, Item, Part, TargetImage, FLAG_IMPORTED};
use crate::tei::{self, attr, xml_id};
use regex::Regex;
use std::collections::HashSet;
use teizone_xml::Document;
use uuid::Uuid;

/// Builds items from TEI surfaces
#[derive(Debug, Clone, Default)]
pub struct TeiItemImporter {
    /// Pattern whose first capture group replaces the URI in descriptions
    pub uri_shortener: Option<Regex>,
}

impl TeiItemImporter {
    /// Create an importer
    #[must_use]
    pub const fn new(uri_shortener: Option<Regex>) -> Self {
        Self { uri_shortener }
    }

    fn shorten(&self, uri: &str) -> String {
        match &self.uri_shortener {
            Some(re) => re.replace_all(uri, "${1}").into_owned(),
            None => uri.to_string(),
        }
    }

    /// Build one item per surface of `doc`
    ///
    /// Items whose title is in `existing_titles` are skipped. A document
    /// without `facsimile` yields no items.
    ///
    /// # Errors
    ///
    /// Returns `TeiError::InvalidArgument` for an empty group id, or
    /// `TeiError::InvalidState` when a surface lacks `n` or `source`.
    pub fn import(
        &self,
        group_id: &str,
        doc: &Document,
        existing_titles: &HashSet<String>,
    ) -> Result<Vec<Item>> {
        if group_id.trim().is_empty() {
            return Err(TeiError::InvalidArgument("group id is empty".to_string()));
        }
        let Some(facsimile) = tei::facsimile(doc) else {
            log::warn!("No facsimile in document for group {group_id}");
            return Ok(Vec::new());
        };

        let page_prefix = format!("{group_id}/");
        let mut items = Vec::new();
        for (ordinal, surface) in doc
            .child_elements_named(facsimile, &tei::tei("surface"))
            .enumerate()
            .map(|(i, s)| (i + 1, s))
        {
            let page = doc.attr(surface, &attr("n")).ok_or_else(|| {
                TeiError::InvalidState(format!("missing page number in surface {ordinal}"))
            })?;
            let uri = doc.attr(surface, &attr("source")).ok_or_else(|| {
                TeiError::InvalidState(format!("missing source URI in surface {ordinal}"))
            })?;

            let title = format!("{group_id} {ordinal:03} {page}");
            if existing_titles.contains(&title) {
                log::debug!("Skipping existing item {title}");
                continue;
            }

            let image_id = page
                .strip_prefix(&page_prefix)
                .filter(|id| !id.is_empty())
                .map_or_else(|| ordinal.to_string(), str::to_string);
            let id = doc
                .attr(surface, &xml_id())
                .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

            items.push(Item {
                id,
                group_id: group_id.to_string(),
                description: format!("{page}: {}", self.shorten(uri)).trim_end().to_string(),
                title,
                flags: FLAG_IMPORTED,
                parts: vec![Part::ImageAnnotations(ImageAnnotationsPart {
                    image: Some(TargetImage {
                        id: image_id,
                        uri: uri.to_string(),
                        title: Some(format!("{group_id}: {page}")),
                        description: Some(page.to_string()),
                    }),
                    annotations: Vec::new(),
                })],
            });
        }
        log::info!("Imported {} item(s) for group {group_id}", items.len());
        Ok(items)
    }
}
