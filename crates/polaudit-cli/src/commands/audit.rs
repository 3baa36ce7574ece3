//! Audit command implementation.

use crate::cli::AuditArgs;
use crate::config::{AuditConfig, ProviderKind};
use crate::error::{CliError, Result};
use polaudit_domain::traits::LlmProvider;
use polaudit_domain::{CancellationToken, DocumentFetcher, Link};
use polaudit_extractor::{DocumentAuditor, ExtractionClient, HostJurisdictionAdvisor, ModelCascade, RateLimiter};
use polaudit_llm::{GeminiProvider, OpenAiProvider};
use polaudit_runner::{read_links, AuditScheduler, HttpFetcher, OutputStore, ResumeTracker, RunMetrics};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Timeout of a single page download
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Execute the audit command.
///
/// Builds the provider and HTTP clients before the async runtime starts;
/// the blocking clients must not be created inside it.
pub fn execute_audit(args: AuditArgs, mut config: AuditConfig) -> Result<RunMetrics> {
    config.apply_args(&args);
    config.validate()?;

    let links = read_links(&args.links)?;
    let tracker = ResumeTracker::load(&args.output, config.runner.identity_hash)?;
    let input = links.len();
    let already_done = links.iter().filter(|l| tracker.is_done(l)).count();
    let pending = tracker.pending(links);
    info!(input, already_done, pending = pending.len(), "Loaded links");

    if pending.is_empty() {
        return Ok(RunMetrics {
            input,
            already_done,
            ..Default::default()
        });
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .map_err(|e| CliError::Http(e.to_string()))?;

    let mut metrics = match config.provider {
        ProviderKind::Gemini => run_with(GeminiProvider::from_env()?, fetcher, &config, &args.output, pending)?,
        ProviderKind::OpenAi => run_with(OpenAiProvider::from_env()?, fetcher, &config, &args.output, pending)?,
    };
    metrics.input = input;
    metrics.already_done = already_done;
    Ok(metrics)
}

/// Wire the pipeline around `provider` and run it to completion
pub fn run_with<P, F>(
    provider: P,
    fetcher: F,
    config: &AuditConfig,
    output: &Path,
    pending: Vec<Link>,
) -> Result<RunMetrics>
where
    P: LlmProvider + Send + Sync + 'static,
    F: DocumentFetcher + Send + Sync + 'static,
{
    let extractor = config.run_extractor();
    let rpm = config.effective_rpm();
    if rpm < config.rate {
        info!(model = %config.model, requested = config.rate, allowed = rpm, "Rate capped by free-tier ceiling");
    }

    let cancel = CancellationToken::new();
    let client = ExtractionClient::new(
        Arc::new(provider),
        Arc::new(RateLimiter::new(rpm, extractor.requests_per_second)),
        Arc::new(ModelCascade::new(extractor.model_cascade.clone())?),
        extractor.retry_policy(),
        cancel.clone(),
    )
    .with_structured_output(extractor.structured_output && config.provider == ProviderKind::Gemini);

    let auditor = DocumentAuditor::new(client, fetcher, Arc::new(HostJurisdictionAdvisor), &extractor)?
        .with_identity_hash(config.runner.identity_hash);
    let store = Arc::new(OutputStore::open(output, config.runner.fsync)?);
    let scheduler = AuditScheduler::new(Arc::new(auditor), store, config.runner.workers);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let metrics = runtime.block_on(async {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && cancel.cancel() {
                warn!("Interrupted, finishing documents in flight");
            }
        });
        scheduler.run(pending).await
    })?;
    Ok(metrics)
}
