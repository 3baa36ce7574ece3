//! Error types for audit runs

use polaudit_extractor::ExtractorError;
use thiserror::Error;

/// Errors that can occur while running an audit
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Reading links or appending to the output store failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document audit failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// A record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl RunnerError {
    /// Whether this error means the whole run must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunnerError::Extractor(e) if e.is_fatal())
    }
}
