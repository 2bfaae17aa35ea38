//! Error types for record extraction and slip composition.
//!
//! Soft failures (nothing extracted) are kept apart from hard failures that
//! abort a generation run. Callers can tell them apart with [`Error::is_soft`].

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting records or composing slips.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No record could be recovered from the token stream
    #[error("No voter records extracted ({pages} pages, {clusters} candidate blocks)")]
    NothingExtracted {
        /// Pages scanned
        pages: usize,
        /// Candidate clusters that were considered
        clusters: usize,
    },

    /// Template bytes could not be parsed
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// A glyph resource is required but was not supplied
    #[error("Missing resource: {0}")]
    ResourceMissing(String),

    /// Bulk record import is malformed
    #[error("Malformed import: {0}")]
    MalformedImport(String),

    /// Composition was asked to render an empty record list
    #[error("No data to render")]
    NoRecords,

    /// Font bytes present but unusable
    #[error("Font error: {0}")]
    Font(String),

    /// Raster image could not be decoded
    #[error("Image error: {0}")]
    Image(String),

    /// Unknown or inconsistent configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Token stream could not be read
    #[error("Token source error: {0}")]
    TokenSource(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure is retry-friendly rather than fatal.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::NothingExtracted { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::InvalidTemplate(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_extracted_is_soft() {
        let err = Error::NothingExtracted {
            pages: 3,
            clusters: 0,
        };
        assert!(err.is_soft());
        let msg = format!("{}", err);
        assert!(msg.contains("3 pages"));
    }

    #[test]
    fn test_hard_errors() {
        assert!(!Error::NoRecords.is_soft());
        assert!(!Error::InvalidTemplate("bad xref".to_string()).is_soft());
        assert!(!Error::MalformedImport("not an array".to_string()).is_soft());
    }

    #[test]
    fn test_no_records_message() {
        assert_eq!(format!("{}", Error::NoRecords), "No data to render");
    }

    #[test]
    fn test_resource_missing_message() {
        let err = Error::ResourceMissing("Bengali font is required".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Missing resource"));
        assert!(msg.contains("Bengali font"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(format!("{}", err).contains("gone"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
