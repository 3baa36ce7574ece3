//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only [`ExtractorError::QuotaExceeded`] escapes a document audit: transient
/// provider failures, unparseable replies and validation failures are
/// absorbed at chunk level.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Every model tier reported quota exhaustion
    #[error("Quota exceeded on every model tier (last tried: {model})")]
    QuotaExceeded {
        /// Last model of the cascade
        model: String,
    },

    /// Details of the wrong document type reached the accumulator
    #[error("Merge error: {0}")]
    Merge(#[from] polaudit_domain::DocTypeMismatch),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether this error must halt the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractorError::QuotaExceeded { .. })
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
