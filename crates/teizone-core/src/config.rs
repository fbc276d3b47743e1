//! TEI header settings for newly created documents

use serde::{Deserialize, Serialize};

fn default_title() -> String {
    "Compendium Historiae in genealogia Christi".to_string()
}

fn default_subtitle_prefix() -> String {
    "Electronic transcription of the manuscript".to_string()
}

fn default_author() -> String {
    "Petrus von Poitiers".to_string()
}

fn default_author_ex() -> String {
    "Petrus Pictaviensis".to_string()
}

fn default_resp() -> String {
    "edited by".to_string()
}

/// Text of the `titleStmt` written into new documents
///
/// The subtitle is `"{subtitle_prefix} {groupId}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Main title
    #[serde(default = "default_title")]
    pub title: String,
    /// Subtitle text preceding the group id
    #[serde(default = "default_subtitle_prefix")]
    pub subtitle_prefix: String,
    /// Author name
    #[serde(default = "default_author")]
    pub author: String,
    /// Expanded (latin) author name, written as `<ex>`
    #[serde(default = "default_author_ex")]
    pub author_ex: String,
    /// Responsibility statement
    #[serde(default = "default_resp")]
    pub resp: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle_prefix: default_subtitle_prefix(),
            author: default_author(),
            author_ex: default_author_ex(),
            resp: default_resp(),
        }
    }
}

impl HeaderConfig {
    /// Subtitle for a group
    #[must_use]
    pub fn subtitle(&self, group_id: &str) -> String {
        format!("{} {group_id}", self.subtitle_prefix).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: HeaderConfig =
            serde_json::from_str(r#"{"title": "Other"}"#).expect("Failed to parse header");
        assert_eq!(config.title, "Other");
        assert_eq!(config.author, "Petrus von Poitiers");
        assert_eq!(
            config.subtitle("ccc-ms029"),
            "Electronic transcription of the manuscript ccc-ms029"
        );
    }
}
