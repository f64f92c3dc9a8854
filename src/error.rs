//! Error types for the topdf library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for topdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading input or writing staging/output files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not exist or is not readable.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The file format is not recognized as a supported flow document.
    #[error("Unknown file format: not a supported flow document")]
    UnknownFormat,

    /// The input bytes are not a valid flow document.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The input document has no content to paginate.
    #[error("Document is empty")]
    EmptyDocument,

    /// Pagination cannot place content under the given geometry.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The object graph is malformed for deduplication or compression.
    ///
    /// Recoverable at the orchestrator boundary: the non-optimized artifact
    /// is kept and this surfaces as a warning unless the caller requires
    /// optimization to succeed.
    #[error("Optimization error: {0}")]
    Optimization(String),

    /// A page geometry dimension is not positive.
    #[error("Invalid geometry: {0}")]
    Geometry(String),
}

impl Error {
    /// Whether the orchestrator may degrade gracefully on this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Optimization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyDocument;
        assert_eq!(err.to_string(), "Document is empty");

        let err = Error::InputNotFound(PathBuf::from("missing.docx"));
        assert_eq!(err.to_string(), "Input file not found: missing.docx");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::Optimization("dangling ref".into()).is_recoverable());
        assert!(!Error::EmptyDocument.is_recoverable());
    }
}
