//! Error types for the annotation library.
//!
//! Only conditions that stop a whole document from being processed are errors.
//! A detection value that cannot be located is reported through
//! [`MatchStatus::NotFound`](crate::annotate::MatchStatus::NotFound), and a
//! stale position-map entry is recorded in
//! [`SpliceReport::skipped`](crate::splice::SpliceReport::skipped).

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, annotating, or saving a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The container archive could not be read or written
    #[error("Archive error: {0}")]
    Archive(String),

    /// A required markup part is absent from the container
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Markup could not be parsed or serialized
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A splice range that violates `start < end <= len`
    #[error("Invalid range {start}..{end} for flattened text of length {len}")]
    InvalidRange {
        /// Requested start (character index)
        start: usize,
        /// Requested end (character index, exclusive)
        end: usize,
        /// Length of the flattened text in characters
        len: usize,
    },

    /// A search pattern could not be compiled
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
