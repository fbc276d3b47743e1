//! `.teizone.toml` discovery and merging
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments (--output, --pattern, etc.)
//! 2. Explicit config (--config <PATH>)
//! 3. Project config (./.teizone.toml)
//! 4. User config (~/.teizone.toml)
//! 5. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use teizone_core::HeaderConfig;

/// Config file name, in the home and the working directory
pub const CONFIG_FILE: &str = ".teizone.toml";

/// Output directory used when neither CLI nor config names one
pub const DEFAULT_OUTPUT_DIR: &str = "tei";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Header of newly created documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderConfig>,

    /// Default settings for build command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,

    /// Default settings for import command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory receiving `{group}.xml`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Keep going after an item fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Regex whose first group replaces source URIs in descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_shortener: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// User config path (~/.teizone.toml)
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE))
    }

    /// Project config path (./.teizone.toml)
    pub fn project_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    fn load_optional(path: &Path, kind: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "{} Failed to load {kind} config from {}: {e:#}",
                    "Warning:".yellow().bold(),
                    path.display(),
                );
                None
            }
        }
    }

    /// Discover and merge all config layers
    ///
    /// Broken user or project files are reported and ignored; an explicit
    /// file that cannot be loaded is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let user = Self::user_path().and_then(|p| Self::load_optional(&p, "user"));
        let project = Self::load_optional(&Self::project_path(), "project");
        let explicit = explicit.map(Self::load_from_file).transpose()?;

        let mut merged = Self::default();
        for layer in [user, project, explicit].into_iter().flatten() {
            merged.overlay(layer);
        }
        Ok(merged)
    }

    /// Apply `other` over `self`, field by field
    ///
    /// A `[header]` table replaces the previous one as a whole; its missing
    /// keys take the built-in defaults.
    pub fn overlay(&mut self, other: Self) {
        if let Some(header) = other.header {
            self.header = Some(header);
        }

        if let Some(build) = other.build {
            let merged = self.build.get_or_insert_with(BuildConfig::default);
            if let Some(output_dir) = build.output_dir {
                merged.output_dir = Some(output_dir);
            }
            if let Some(continue_on_error) = build.continue_on_error {
                merged.continue_on_error = Some(continue_on_error);
            }
        }

        if let Some(import) = other.import {
            let merged = self.import.get_or_insert_with(ImportConfig::default);
            if let Some(uri_shortener) = import.uri_shortener {
                merged.uri_shortener = Some(uri_shortener);
            }
        }
    }

    /// Config with every built-in default filled in
    #[must_use]
    pub fn effective(&self) -> Self {
        let build = self.build.clone().unwrap_or_default();
        Self {
            header: Some(self.header()),
            build: Some(BuildConfig {
                output_dir: Some(
                    build
                        .output_dir
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
                ),
                continue_on_error: Some(build.continue_on_error.unwrap_or(false)),
            }),
            import: self.import.clone(),
        }
    }

    /// Header settings, defaulted
    #[must_use]
    pub fn header(&self) -> HeaderConfig {
        self.header.clone().unwrap_or_default()
    }

    /// Resolve output directory from CLI, config, or default
    #[must_use]
    pub fn resolve_output_dir(&self, cli_value: Option<PathBuf>) -> PathBuf {
        cli_value
            .or_else(|| self.build.as_ref().and_then(|b| b.output_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// A set CLI flag wins; otherwise the config decides
    #[must_use]
    pub fn resolve_continue_on_error(&self, cli_flag: bool) -> bool {
        cli_flag
            || self
                .build
                .as_ref()
                .and_then(|b| b.continue_on_error)
                .unwrap_or(false)
    }

    /// Resolve URI shortener pattern from CLI or config
    #[must_use]
    pub fn resolve_uri_shortener(&self, cli_value: Option<String>) -> Option<String> {
        cli_value.or_else(|| self.import.as_ref().and_then(|i| i.uri_shortener.clone()))
    }
}
