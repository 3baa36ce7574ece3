//! Model calls with retry, model downgrade and freeform fallback

use crate::error::ExtractorError;
use crate::parser::{parse_freeform, parse_structured};
use crate::rate_limit::RateLimiter;
use crate::types::{Prompt, RawExtraction};
use polaudit_domain::traits::{FailureKind, LlmProvider, ProviderError};
use polaudit_domain::CancellationToken;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Ordered list of models, strongest first, with a sticky current tier
///
/// Shared by every worker of a run: once one worker downgrades, later calls
/// from any worker start at the weaker tier.
#[derive(Debug)]
pub struct ModelCascade {
    models: Vec<String>,
    current: AtomicUsize,
}

impl ModelCascade {
    /// Create a cascade; blank names are dropped and at least one must remain
    pub fn new(models: impl IntoIterator<Item = String>) -> Result<Self, ExtractorError> {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(ExtractorError::Config("model cascade is empty".into()));
        }
        Ok(Self {
            models,
            current: AtomicUsize::new(0),
        })
    }

    /// Model new calls should target
    pub fn current(&self) -> &str {
        let idx = self.current.load(Ordering::SeqCst).min(self.models.len() - 1);
        &self.models[idx]
    }

    /// Step down after `failed` reported quota exhaustion
    ///
    /// Returns the model to retry with, or `None` when `failed` is the last
    /// tier. Concurrent downgrades from the same tier move the cascade once.
    pub fn downgrade_from(&self, failed: &str) -> Option<&str> {
        let failed_idx = self.models.iter().position(|m| m == failed)?;
        let next = failed_idx + 1;
        if next >= self.models.len() {
            return None;
        }
        self.current.fetch_max(next, Ordering::SeqCst);
        Some(self.current())
    }

    /// Every tier, strongest first
    pub fn models(&self) -> &[String] {
        &self.models
    }
}

/// Backoff and budget for failed calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed per chunk for transient failures
    pub max_retries: u32,
    /// Delay before the first retry
    pub backoff_base: Duration,
    /// Growth factor of the delay between retries
    pub backoff_factor: f64,
    /// Upper bound of the random delay added to each backoff
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_factor: 1.5,
            jitter: Duration::from_secs(1),
        }
    }
}

/// State of the call sequence for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Model targeted by the next call
    pub model: String,
    /// Whether the next call is schema-constrained
    pub structured: bool,
    /// Retries consumed so far
    pub retries_used: u32,
}

/// What one call produced, as seen by the retry policy
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The reply parsed
    Parsed(T),
    /// The provider answered, but nothing could be parsed out of it
    Unparseable,
    /// The provider call failed
    Failed(FailureKind),
}

/// Decision taken after one call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// Done, with a parsed reply
    Success(T),
    /// Call again after `delay`
    Retry {
        /// Shape of the next call
        next: Attempt,
        /// Wait before the next call
        delay: Duration,
    },
    /// Stop without a reply; the chunk is skipped
    GiveUp,
    /// Every model tier is out of quota; the run must stop
    Fatal,
}

impl RetryPolicy {
    /// Delay before retry number `retries_used + 1`
    pub fn backoff(&self, retries_used: u32) -> Duration {
        let exponent = i32::try_from(retries_used).unwrap_or(i32::MAX);
        let scaled = self.backoff_base.as_secs_f64() * self.backoff_factor.powi(exponent);
        let base = Duration::try_from_secs_f64(scaled).unwrap_or(Duration::MAX);
        base.saturating_add(self.jitter_sample())
    }

    fn jitter_sample(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Decide what follows `observation` on `attempt`
    ///
    /// Quota failures step down the cascade without consuming the retry
    /// budget. A structured call that is unsupported or unparseable falls
    /// back to freeform at once; a transient structured failure also falls
    /// back, after a backoff that consumes budget.
    pub fn evaluate<T>(
        &self,
        observation: Observation<T>,
        attempt: &Attempt,
        cascade: &ModelCascade,
    ) -> CallOutcome<T> {
        match observation {
            Observation::Parsed(value) => CallOutcome::Success(value),

            Observation::Failed(FailureKind::Quota) => match cascade.downgrade_from(&attempt.model) {
                Some(next_model) => CallOutcome::Retry {
                    next: Attempt {
                        model: next_model.to_string(),
                        ..attempt.clone()
                    },
                    delay: Duration::ZERO,
                },
                None => CallOutcome::Fatal,
            },

            Observation::Unparseable | Observation::Failed(FailureKind::Unsupported) => {
                if attempt.structured {
                    CallOutcome::Retry {
                        next: Attempt {
                            model: cascade.current().to_string(),
                            structured: false,
                            retries_used: attempt.retries_used,
                        },
                        delay: Duration::ZERO,
                    }
                } else {
                    CallOutcome::GiveUp
                }
            }

            Observation::Failed(FailureKind::Transient | FailureKind::InvalidResponse) => {
                if attempt.retries_used >= self.max_retries {
                    return CallOutcome::GiveUp;
                }
                CallOutcome::Retry {
                    next: Attempt {
                        model: cascade.current().to_string(),
                        structured: false,
                        retries_used: attempt.retries_used + 1,
                    },
                    delay: self.backoff(attempt.retries_used),
                }
            }
        }
    }
}

/// Rate-limited, retrying front of a model provider
///
/// One client is shared by every worker of a run; the provider, limiter,
/// cascade and cancellation token behind it are all shared state.
pub struct ExtractionClient<P> {
    provider: Arc<P>,
    limiter: Arc<RateLimiter>,
    cascade: Arc<ModelCascade>,
    policy: RetryPolicy,
    structured_output: bool,
    cancel: CancellationToken,
}

impl<P> ExtractionClient<P>
where
    P: LlmProvider + Send + Sync,
{
    /// Create a new extraction client
    pub fn new(
        provider: Arc<P>,
        limiter: Arc<RateLimiter>,
        cascade: Arc<ModelCascade>,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            limiter,
            cascade,
            policy,
            structured_output: true,
            cancel,
        }
    }

    /// Enable or disable schema-constrained calls
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    /// The model cascade this client downgrades through
    pub fn cascade(&self) -> &ModelCascade {
        &self.cascade
    }

    /// The run's cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Obtain a details object for `prompt`
    ///
    /// `Ok(None)` means the chunk yields nothing: retries ran out, the reply
    /// never parsed, or the run was cancelled. `Err(QuotaExceeded)` is
    /// returned once every tier is exhausted, after cancelling the run.
    pub fn extract(&self, prompt: &Prompt) -> Result<Option<RawExtraction>, ExtractorError> {
        let mut attempt = Attempt {
            model: self.cascade.current().to_string(),
            structured: self.structured_output,
            retries_used: 0,
        };

        loop {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            self.limiter.acquire();
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            let observation = self.call(prompt, &attempt);
            match self.policy.evaluate(observation, &attempt, &self.cascade) {
                CallOutcome::Success(raw) => return Ok(Some(raw)),
                CallOutcome::Retry { next, delay } => {
                    if next.model != attempt.model {
                        warn!(from = %attempt.model, to = %next.model, "Quota exhausted, downgrading model");
                    } else if attempt.structured && !next.structured {
                        debug!(model = %next.model, "Falling back to freeform generation");
                    } else {
                        debug!(
                            model = %next.model,
                            retry = next.retries_used,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying model call"
                        );
                    }
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt = next;
                }
                CallOutcome::GiveUp => {
                    warn!(model = %attempt.model, retries = attempt.retries_used, "No usable reply for chunk");
                    return Ok(None);
                }
                CallOutcome::Fatal => {
                    if self.cancel.cancel() {
                        error!(model = %attempt.model, "Quota exhausted on every model tier, stopping run");
                    }
                    return Err(ExtractorError::QuotaExceeded {
                        model: attempt.model,
                    });
                }
            }
        }
    }

    fn call(&self, prompt: &Prompt, attempt: &Attempt) -> Observation<RawExtraction> {
        let reply = if attempt.structured {
            self.provider
                .generate_structured(&attempt.model, &prompt.text, &prompt.schema)
                .map(|text| parse_structured(&text))
        } else {
            self.provider
                .generate(&attempt.model, &prompt.text)
                .map(|text| parse_freeform(&text))
        };

        match reply {
            Ok(Some(raw)) => Observation::Parsed(raw),
            Ok(None) => {
                debug!(model = %attempt.model, structured = attempt.structured, "Reply held no JSON object");
                Observation::Unparseable
            }
            Err(e) => {
                debug!(model = %attempt.model, error = %e, "Model call failed");
                Observation::Failed(e.kind())
            }
        }
    }
}

impl<P> std::fmt::Debug for ExtractionClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionClient")
            .field("cascade", &self.cascade)
            .field("policy", &self.policy)
            .field("structured_output", &self.structured_output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::ManualClock;
    use polaudit_domain::DocType;
    use polaudit_llm::{MockProvider, MockReply};
    use serde_json::json;

    fn cascade(models: &[&str]) -> Arc<ModelCascade> {
        Arc::new(ModelCascade::new(models.iter().map(|m| m.to_string())).unwrap())
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::ZERO,
            backoff_factor: 1.5,
            jitter: Duration::ZERO,
        }
    }

    fn client(provider: &MockProvider, models: &[&str]) -> ExtractionClient<MockProvider> {
        ExtractionClient::new(
            Arc::new(provider.clone()),
            Arc::new(RateLimiter::with_clock(1000, 1000, ManualClock::new())),
            cascade(models),
            no_wait(),
            CancellationToken::new(),
        )
    }

    fn prompt() -> Prompt {
        Prompt {
            text: "prompt".into(),
            schema: json!({}),
            doc_type: DocType::LegalNotice,
        }
    }

    fn attempt(model: &str, structured: bool, retries_used: u32) -> Attempt {
        Attempt {
            model: model.into(),
            structured,
            retries_used,
        }
    }

    #[test]
    fn test_cascade_rejects_empty() {
        assert!(ModelCascade::new(Vec::<String>::new()).is_err());
        assert!(ModelCascade::new(vec![" ".to_string()]).is_err());
    }

    #[test]
    fn test_cascade_downgrade_is_sticky() {
        let cascade = cascade(&["a", "b", "c"]);
        assert_eq!(cascade.current(), "a");
        assert_eq!(cascade.downgrade_from("a"), Some("b"));
        // A second worker reporting the same tier does not skip "b"
        assert_eq!(cascade.downgrade_from("a"), Some("b"));
        assert_eq!(cascade.downgrade_from("b"), Some("c"));
        assert_eq!(cascade.downgrade_from("c"), None);
        assert_eq!(cascade.current(), "c");
    }

    #[test]
    fn test_backoff_grows_geometrically() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: Duration::ZERO,
        };
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let policy = RetryPolicy {
            jitter: Duration::from_millis(500),
            ..no_wait()
        };
        for _ in 0..50 {
            assert!(policy.backoff(1) <= Duration::from_millis(500));
        }
    }

    #[test]
    fn test_policy_quota_downgrades_without_budget() {
        let cascade = cascade(&["a", "b"]);
        let outcome = no_wait().evaluate::<()>(
            Observation::Failed(FailureKind::Quota),
            &attempt("a", true, 1),
            &cascade,
        );
        assert_eq!(
            outcome,
            CallOutcome::Retry {
                next: attempt("b", true, 1),
                delay: Duration::ZERO
            }
        );
        let outcome = no_wait().evaluate::<()>(
            Observation::Failed(FailureKind::Quota),
            &attempt("b", true, 1),
            &cascade,
        );
        assert_eq!(outcome, CallOutcome::Fatal);
    }

    #[test]
    fn test_policy_transient_consumes_budget() {
        let cascade = cascade(&["a"]);
        let outcome = no_wait().evaluate::<()>(
            Observation::Failed(FailureKind::Transient),
            &attempt("a", true, 0),
            &cascade,
        );
        assert_eq!(
            outcome,
            CallOutcome::Retry {
                next: attempt("a", false, 1),
                delay: Duration::ZERO
            }
        );
        let outcome = no_wait().evaluate::<()>(
            Observation::Failed(FailureKind::Transient),
            &attempt("a", false, 2),
            &cascade,
        );
        assert_eq!(outcome, CallOutcome::GiveUp);
    }

    #[test]
    fn test_policy_structured_fallback() {
        let cascade = cascade(&["a"]);
        for observation in [Observation::Unparseable, Observation::Failed(FailureKind::Unsupported)] {
            let outcome = no_wait().evaluate::<()>(observation.clone(), &attempt("a", true, 0), &cascade);
            assert_eq!(
                outcome,
                CallOutcome::Retry {
                    next: attempt("a", false, 0),
                    delay: Duration::ZERO
                }
            );
            let outcome = no_wait().evaluate::<()>(observation, &attempt("a", false, 0), &cascade);
            assert_eq!(outcome, CallOutcome::GiveUp);
        }
    }

    #[test]
    fn test_extract_structured_success() {
        let provider = MockProvider::new(r#"{"details": {"owner": "Acme"}}"#);
        let raw = client(&provider, &["a"]).extract(&prompt()).unwrap().unwrap();
        assert_eq!(raw.details, json!({"owner": "Acme"}));
        assert_eq!(provider.call_count(), 1);
        assert!(provider.calls()[0].structured);
    }

    #[test]
    fn test_extract_falls_back_to_freeform() {
        let provider = MockProvider::new(r#"Sure: {"details": {"owner": "Acme"}}"#).without_structured_output();
        let raw = client(&provider, &["a"]).extract(&prompt()).unwrap().unwrap();
        assert_eq!(raw.details, json!({"owner": "Acme"}));
        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].structured);
        assert!(!calls[1].structured);
    }

    #[test]
    fn test_extract_structured_disabled() {
        let provider = MockProvider::new(r#"{"owner": "Acme"}"#);
        let client = client(&provider, &["a"]).with_structured_output(false);
        assert!(client.extract(&prompt()).unwrap().is_some());
        assert!(!provider.calls()[0].structured);
    }

    #[test]
    fn test_extract_gives_up_after_retries() {
        let provider = MockProvider::default();
        provider.script("a", std::iter::repeat_with(MockReply::transient).take(10));
        let result = client(&provider, &["a"]).extract(&prompt()).unwrap();
        assert!(result.is_none());
        // First call plus max_retries
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_extract_quota_cascade_exhausted() {
        let provider = MockProvider::default();
        for model in ["a", "b", "c"] {
            provider.script(model, [MockReply::quota()]);
        }
        let client = client(&provider, &["a", "b", "c"]);
        let err = client.extract(&prompt()).unwrap_err();

        assert!(matches!(err, ExtractorError::QuotaExceeded { ref model } if model == "c"));
        assert!(client.cancellation().is_cancelled());
        assert_eq!(provider.models_called(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_extract_quota_then_success_on_weaker_tier() {
        let provider = MockProvider::new(r#"{"owner": "Acme"}"#);
        provider.script("a", [MockReply::quota()]);
        let client = client(&provider, &["a", "b"]);
        assert!(client.extract(&prompt()).unwrap().is_some());
        assert_eq!(client.cascade().current(), "b");

        // Later chunks start at the downgraded tier
        client.extract(&prompt()).unwrap();
        assert_eq!(provider.models_called(), vec!["a", "b", "b"]);
    }

    #[test]
    fn test_extract_returns_none_when_cancelled() {
        let provider = MockProvider::new(r#"{"owner": "Acme"}"#);
        let client = client(&provider, &["a"]);
        client.cancellation().cancel();
        assert!(client.extract(&prompt()).unwrap().is_none());
        assert_eq!(provider.call_count(), 0);
    }
}
