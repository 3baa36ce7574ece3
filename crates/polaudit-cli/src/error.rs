//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model provider could not be set up
    #[error("Provider error: {0}")]
    Provider(#[from] polaudit_llm::LlmError),

    /// Extraction setup error
    #[error(transparent)]
    Extractor(#[from] polaudit_extractor::ExtractorError),

    /// Run error
    #[error(transparent)]
    Runner(#[from] polaudit_runner::RunnerError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The run stopped because every model tier ran out of quota
    #[error("Run halted: quota exhausted on every model tier")]
    QuotaHalted,
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::QuotaHalted => 2,
            _ => 1,
        }
    }
}
