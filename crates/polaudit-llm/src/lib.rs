//! polaudit LLM Provider Layer
//!
//! Pluggable model provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `polaudit-domain`.
//! Every provider reports failures as an [`LlmError`], whose
//! [`FailureKind`](polaudit_domain::FailureKind) tells the extraction client
//! whether to retry, downgrade the model, or fall back to freeform output.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted, deterministic provider for testing
//! - `GeminiProvider`: Google Generative Language API, with schema-constrained output
//! - `OpenAiProvider`: OpenAI chat completions, freeform output only
//!
//! # Examples
//!
//! ```
//! use polaudit_llm::MockProvider;
//! use polaudit_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"details": {}}"#);
//! let result = provider.generate("gemini-2.5-pro", "test prompt").unwrap();
//! assert_eq!(result, r#"{"details": {}}"#);
//! ```

#![warn(missing_docs)]

pub mod gemini;
pub mod models;
pub mod openai;

use polaudit_domain::traits::{FailureKind, LlmProvider as LlmProviderTrait, ProviderError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The provider answered with a 5xx status
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error body returned by the provider
        message: String,
    },

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Quota or rate limit exhausted for the requested model
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Invalid or empty response from the model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider cannot serve this request shape
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Message fragments that identify quota or rate-limit exhaustion
const QUOTA_MARKERS: [&str; 4] = ["quota", "resource_exhausted", "rate limit", "rate_limit"];

impl LlmError {
    /// Classify an unsuccessful HTTP answer
    ///
    /// 5xx answers are always transient, whatever their body says.
    pub fn from_status(status: u16, body: &str) -> Self {
        if (500..=599).contains(&status) {
            return LlmError::Server {
                status,
                message: truncate(body),
            };
        }
        let lowered = body.to_lowercase();
        if status == 429 || QUOTA_MARKERS.iter().any(|m| lowered.contains(m)) {
            return LlmError::QuotaExceeded(truncate(body));
        }
        match status {
            400 if lowered.contains("response_schema") || lowered.contains("responseschema") => {
                LlmError::Unsupported(truncate(body))
            }
            401 | 403 => LlmError::Other(format!("Authentication failed: {}", truncate(body))),
            404 => LlmError::Other(format!("Model not found: {}", truncate(body))),
            _ => LlmError::Other(format!("HTTP {}: {}", status, truncate(body))),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

impl ProviderError for LlmError {
    fn kind(&self) -> FailureKind {
        match self {
            LlmError::Communication(_) | LlmError::Server { .. } | LlmError::Timeout => {
                FailureKind::Transient
            }
            LlmError::QuotaExceeded(_) => FailureKind::Quota,
            LlmError::Unsupported(_) => FailureKind::Unsupported,
            LlmError::InvalidResponse(_) | LlmError::Other(_) => FailureKind::InvalidResponse,
        }
    }
}

/// Keep provider error bodies readable in logs
fn truncate(body: &str) -> String {
    const MAX: usize = 300;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// One scripted answer of the [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Answer with this text
    Text(String),

    /// Fail with this error
    Fail(LlmError),
}

impl MockReply {
    /// Shorthand for a text answer
    pub fn text(s: impl Into<String>) -> Self {
        MockReply::Text(s.into())
    }

    /// Shorthand for a quota failure
    pub fn quota() -> Self {
        MockReply::Fail(LlmError::QuotaExceeded("mock quota".into()))
    }

    /// Shorthand for a transient failure
    pub fn transient() -> Self {
        MockReply::Fail(LlmError::Server {
            status: 503,
            message: "mock unavailable".into(),
        })
    }
}

/// A call observed by the [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Model the call targeted
    pub model: String,

    /// Whether the schema-constrained entry point was used
    pub structured: bool,

    /// Prompt sent
    pub prompt: String,
}

#[derive(Debug, Default)]
struct MockState {
    scripts: HashMap<String, VecDeque<MockReply>>,
    calls: Vec<MockCall>,
}

/// Mock LLM provider for deterministic testing
///
/// Answers are scripted per model and consumed in order; once a model's
/// script runs out, the default response is returned. Structured and
/// freeform calls draw from the same script.
///
/// # Examples
///
/// ```
/// use polaudit_llm::{MockProvider, MockReply};
/// use polaudit_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.script("model-a", [MockReply::quota()]);
///
/// assert!(provider.generate("model-a", "p").is_err());
/// assert_eq!(provider.generate("model-a", "p").unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    structured_supported: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            structured_supported: true,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Report schema-constrained calls as unsupported
    pub fn without_structured_output(mut self) -> Self {
        self.structured_supported = false;
        self
    }

    /// Append answers to the script of `model`
    pub fn script(&self, model: impl Into<String>, replies: impl IntoIterator<Item = MockReply>) {
        self.lock()
            .scripts
            .entry(model.into())
            .or_default()
            .extend(replies);
    }

    /// Get the number of calls made so far
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Models targeted so far, oldest first
    pub fn models_called(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.model.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn answer(&self, model: &str, prompt: &str, structured: bool) -> Result<String, LlmError> {
        let mut state = self.lock();
        state.calls.push(MockCall {
            model: model.to_string(),
            structured,
            prompt: prompt.to_string(),
        });

        if structured && !self.structured_supported {
            return Err(LlmError::Unsupported("mock has no structured output".into()));
        }

        match state.scripts.get_mut(model).and_then(|s| s.pop_front()) {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(err)) => Err(err),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, model: &str, prompt: &str) -> Result<String, Self::Error> {
        self.answer(model, prompt, false)
    }

    fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<String, Self::Error> {
        self.answer(model, prompt, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("m", "any prompt");
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_scripts_are_per_model() {
        let provider = MockProvider::default();
        provider.script("a", [MockReply::text("from a")]);
        provider.script("b", [MockReply::text("from b")]);

        assert_eq!(provider.generate("b", "p").unwrap(), "from b");
        assert_eq!(provider.generate("a", "p").unwrap(), "from a");
        assert_eq!(provider.generate("a", "p").unwrap(), "{}");
        assert_eq!(provider.models_called(), vec!["b", "a", "a"]);
    }

    #[test]
    fn test_mock_provider_unsupported_structured() {
        let provider = MockProvider::new("x").without_structured_output();
        let err = provider
            .generate_structured("m", "p", &json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unsupported);
        assert!(provider.calls()[0].structured);
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("m", "test").unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(LlmError::from_status(429, "").kind(), FailureKind::Quota);
        assert_eq!(
            LlmError::from_status(400, r#"{"status":"RESOURCE_EXHAUSTED"}"#).kind(),
            FailureKind::Quota
        );
        assert_eq!(LlmError::from_status(503, "busy").kind(), FailureKind::Transient);
        assert_eq!(
            LlmError::from_status(400, "Invalid JSON payload: unknown name responseSchema").kind(),
            FailureKind::Unsupported
        );
        assert_eq!(
            LlmError::from_status(401, "bad key").kind(),
            FailureKind::InvalidResponse
        );
    }

    #[test]
    fn test_server_deadline_is_transient_not_quota() {
        let err = LlmError::from_status(
            504,
            r#"{"error":{"code":504,"message":"Deadline exceeded","status":"DEADLINE_EXCEEDED"}}"#,
        );
        assert!(matches!(err, LlmError::Server { status: 504, .. }));
        assert_eq!(err.kind(), FailureKind::Transient);

        // Quota wording on a 5xx answer is still transient
        assert_eq!(LlmError::from_status(503, "quota backend unavailable").kind(), FailureKind::Transient);
        assert_eq!(
            LlmError::from_status(400, "Request exceeded the maximum payload size").kind(),
            FailureKind::InvalidResponse
        );
    }

    #[test]
    fn test_timeout_is_transient() {
        assert_eq!(LlmError::Timeout.kind(), FailureKind::Transient);
    }

    #[test]
    fn test_truncate_long_bodies() {
        let body = "x".repeat(1000);
        let err = LlmError::from_status(502, &body);
        match err {
            LlmError::Server { message, .. } => assert!(message.len() < 320),
            other => panic!("unexpected {:?}", other),
        }
    }
}
