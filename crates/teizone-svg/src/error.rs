//! Selector error types

use teizone_xml::XmlError;
use thiserror::Error;

/// Selector conversion errors
#[derive(Error, Debug)]
pub enum SelectorError {
    /// Selector is neither a pixel rectangle nor a recognized SVG shape
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Error while writing shape markup into the target tree
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

/// Result type for selector operations
pub type Result<T> = std::result::Result<T, SelectorError>;
