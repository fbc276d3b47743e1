//! Error types for TEI composition and import.

use teizone_svg::SelectorError;
use teizone_xml::XmlError;
use thiserror::Error;

/// Errors raised while composing or importing TEI documents.
///
/// All variants propagate to the caller except [`TeiError::UnrecognizedEntityKind`],
/// which the composer only logs as a warning.
#[derive(Error, Debug)]
pub enum TeiError {
    /// A required input is missing or empty (e.g. an empty group id).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A region selector could not be converted.
    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    /// The document lacks a required structure (facsimile, body, surface attributes).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An entity id whose first character maps to no known entry type.
    #[error("Unrecognized entity kind in eid {eid:?} of annotation {annotation_id}")]
    UnrecognizedEntityKind {
        /// Annotation unique id
        annotation_id: String,
        /// Offending entity id
        eid: String,
    },

    /// XML tree error.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for teizone operations.
pub type Result<T> = std::result::Result<T, TeiError>;
