//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::fmt;

/// How a failed provider call should be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network error, server error or timeout; worth retrying with backoff
    Transient,

    /// Quota or rate-limit exhaustion for the requested model
    Quota,

    /// The provider cannot serve this kind of request (e.g. schema-constrained output)
    Unsupported,

    /// The provider answered, but with nothing usable
    InvalidResponse,
}

/// Error bound for model providers
///
/// Callers never inspect provider-specific variants; they only need the
/// failure class to decide between retry, model downgrade and fallback.
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// Classify this failure
    fn kind(&self) -> FailureKind;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (polaudit-llm). Calls are
/// blocking; concurrency comes from running several callers in parallel.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error: ProviderError;

    /// Generate a freeform text completion with `model`
    fn generate(&self, model: &str, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to the JSON schema `schema`
    ///
    /// Providers without constrained decoding return an error whose kind is
    /// [`FailureKind::Unsupported`].
    fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, Self::Error>;
}

/// Plain text of a fetched document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Extracted plain text (empty when the document could not be obtained)
    pub text: String,

    /// MIME type reported by the origin
    pub mime: String,
}

impl FetchedDocument {
    /// The "nothing obtained" result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no usable text was obtained
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait for obtaining the plain text of a document
///
/// Failures never cross this boundary as errors: they are reported as an
/// empty [`FetchedDocument`].
pub trait DocumentFetcher {
    /// Fetch `url`, preferring content in `lang` when given
    fn fetch(&self, url: &str, lang: Option<&str>) -> FetchedDocument;
}

/// Legal jurisdiction inferred for a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jurisdiction {
    /// Short code ("UK", "MX", "GEN", ...)
    pub code: String,

    /// Hint injected into the extraction prompt
    pub hint: String,
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Trait for inferring the jurisdiction of a document
pub trait JurisdictionAdvisor {
    /// Advise on `url`, writing the hint in `lang` when supported
    fn advise(&self, url: &str, lang: Option<&str>) -> Jurisdiction;
}
