//! Error types for XML tree operations

use std::io;
use thiserror::Error;

/// XML tree errors
#[derive(Debug, Error)]
pub enum XmlError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing or writing error
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute in the source markup
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid tree structure (no root, unbalanced tags, cyclic insertion)
    #[error("Invalid XML structure: {0}")]
    InvalidStructure(String),

    /// Invalid argument passed to a tree operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for XML tree operations
pub type Result<T> = std::result::Result<T, XmlError>;
