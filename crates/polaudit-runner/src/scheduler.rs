//! Bounded worker pool running one audit task per document

use crate::error::RunnerError;
use crate::metrics::RunMetrics;
use crate::store::OutputStore;
use polaudit_domain::traits::{DocumentFetcher, LlmProvider};
use polaudit_domain::{CancellationToken, Link};
use polaudit_extractor::{AuditOutcome, DocumentAuditor};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

/// Runs audits across a fixed number of workers
///
/// Every task audits one document on a blocking thread (chunks strictly in
/// order) and appends its record to the output store before finishing.
/// Tasks share the auditor's rate limiter, model cascade and cancellation
/// token. Once the token is set no new task is dispatched.
pub struct AuditScheduler<P, F> {
    auditor: Arc<DocumentAuditor<P, F>>,
    store: Arc<OutputStore>,
    workers: usize,
}

impl<P, F> AuditScheduler<P, F>
where
    P: LlmProvider + Send + Sync + 'static,
    F: DocumentFetcher + Send + Sync + 'static,
{
    /// Create a scheduler with `workers` concurrent tasks (at least one)
    pub fn new(auditor: Arc<DocumentAuditor<P, F>>, store: Arc<OutputStore>, workers: usize) -> Self {
        Self {
            auditor,
            store,
            workers: workers.max(1),
        }
    }

    /// The run's cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        self.auditor.client().cancellation()
    }

    /// Audit every link in `links`
    ///
    /// Returns the run metrics; quota exhaustion is reported through
    /// [`RunMetrics::quota_halted`] rather than as an error.
    pub async fn run(&self, links: Vec<Link>) -> Result<RunMetrics, RunnerError> {
        let started = Instant::now();
        let cancel = self.cancellation().clone();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut metrics = RunMetrics {
            pending: links.len(),
            ..Default::default()
        };

        info!(pending = links.len(), workers = self.workers, "Starting audit run");

        let mut dispatched = 0usize;
        for link in links {
            if cancel.is_cancelled() {
                break;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| RunnerError::Worker(e.to_string()))?;
            if cancel.is_cancelled() {
                break;
            }

            let auditor = Arc::clone(&self.auditor);
            let store = Arc::clone(&self.store);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = audit_and_store(&auditor, &store, &link);
                (link.url, result)
            });
            dispatched += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            absorb(&mut metrics, joined);
        }

        metrics.not_started = metrics.pending - dispatched;
        metrics.total_runtime_secs = started.elapsed().as_secs();
        info!(
            written = metrics.written,
            partial = metrics.partial,
            errors = metrics.errors,
            quota_halted = metrics.quota_halted,
            "Audit run finished"
        );
        Ok(metrics)
    }
}

/// One task: audit a document and persist its record
fn audit_and_store<P, F>(
    auditor: &DocumentAuditor<P, F>,
    store: &OutputStore,
    link: &Link,
) -> Result<AuditOutcome, RunnerError>
where
    P: LlmProvider + Send + Sync,
    F: DocumentFetcher,
{
    let outcome = auditor.audit(link)?;
    if let Some(record) = outcome.record() {
        store.append(record)?;
    }
    Ok(outcome)
}

fn absorb(
    metrics: &mut RunMetrics,
    joined: Result<(String, Result<AuditOutcome, RunnerError>), JoinError>,
) {
    match joined {
        Ok((_, Ok(outcome))) => metrics.record_outcome(&outcome),
        Ok((url, Err(e))) if e.is_fatal() => {
            warn!(url = %url, "Document abandoned on quota exhaustion");
            metrics.quota_halted = true;
            metrics.record_error();
        }
        Ok((url, Err(e))) => {
            error!(url = %url, error = %e, "Audit task failed");
            metrics.record_error();
        }
        Err(e) => {
            error!(error = ?e, "Audit task panicked");
            metrics.record_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::ResumeTracker;
    use polaudit_domain::{DocType, DocumentRecord, FetchedDocument, IdentityHash};
    use polaudit_extractor::{
        ExtractionClient, ExtractorConfig, HostJurisdictionAdvisor, ManualClock, ModelCascade,
        RateLimiter, RetryPolicy,
    };
    use polaudit_llm::{MockProvider, MockReply};
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    /// Serves fixed text per URL; unknown URLs fetch nothing
    struct MapFetcher(HashMap<String, String>);

    impl DocumentFetcher for MapFetcher {
        fn fetch(&self, url: &str, _lang: Option<&str>) -> FetchedDocument {
            match self.0.get(url) {
                Some(text) => FetchedDocument {
                    text: text.clone(),
                    mime: "text/plain".into(),
                },
                None => FetchedDocument::empty(),
            }
        }
    }

    fn links(n: usize) -> Vec<Link> {
        (0..n)
            .map(|i| Link::new("a.org", format!("https://a.org/{}", i), DocType::LegalNotice))
            .collect()
    }

    fn scheduler(
        provider: &MockProvider,
        pages: &[Link],
        output: &Path,
        workers: usize,
    ) -> AuditScheduler<MockProvider, MapFetcher> {
        let config = ExtractorConfig {
            model_cascade: vec!["m".into()],
            ..Default::default()
        };
        let client = ExtractionClient::new(
            Arc::new(provider.clone()),
            Arc::new(RateLimiter::with_clock(1000, 1000, ManualClock::new())),
            Arc::new(ModelCascade::new(config.model_cascade.clone()).unwrap()),
            RetryPolicy {
                max_retries: 0,
                backoff_base: Duration::ZERO,
                backoff_factor: 1.0,
                jitter: Duration::ZERO,
            },
            CancellationToken::new(),
        );
        let fetcher = MapFetcher(
            pages
                .iter()
                .map(|l| (l.url.clone(), format!("Aviso legal de {}", l.url)))
                .collect(),
        );
        let auditor =
            DocumentAuditor::new(client, fetcher, Arc::new(HostJurisdictionAdvisor), &config).unwrap();
        let store = Arc::new(OutputStore::open(output, false).unwrap());
        AuditScheduler::new(Arc::new(auditor), store, workers)
    }

    fn read_records(path: &Path) -> Vec<DocumentRecord> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_line_per_document_with_facts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let provider = MockProvider::new(r#"{"details": {"owner": "A Org"}}"#);
        let all = links(5);
        // The last link has no page
        let scheduler = scheduler(&provider, &all[..4], &output, 3);

        let metrics = scheduler.run(all).await.unwrap();
        assert_eq!(metrics.written, 4);
        assert_eq!(metrics.fetch_failed, 1);
        assert_eq!(metrics.errors, 0);
        assert!(!metrics.quota_halted);

        let records = read_records(&output);
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.sha1 == IdentityHash::Sha1.digest(&r.url)));
    }

    #[tokio::test]
    async fn test_resume_processes_only_missing_links() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let provider = MockProvider::new(r#"{"details": {"owner": "A Org"}}"#);
        let all = links(5);

        let first = scheduler(&provider, &all, &output, 2);
        first.run(all[..2].to_vec()).await.unwrap();
        assert_eq!(read_records(&output).len(), 2);

        let tracker = ResumeTracker::load(&output, IdentityHash::Sha1).unwrap();
        let pending = tracker.pending(all.clone());
        assert_eq!(pending.len(), 3);

        let second = scheduler(&provider, &all, &output, 2);
        let metrics = second.run(pending).await.unwrap();
        assert_eq!(metrics.written, 3);

        let records = read_records(&output);
        assert_eq!(records.len(), 5);
        let tracker = ResumeTracker::load(&output, IdentityHash::Sha1).unwrap();
        assert!(tracker.pending(all).is_empty());
    }

    #[tokio::test]
    async fn test_quota_halt_stops_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let provider = MockProvider::default();
        provider.script("m", [MockReply::quota()]);
        let all = links(4);
        let scheduler = scheduler(&provider, &all, &output, 1);

        let metrics = scheduler.run(all).await.unwrap();
        assert!(metrics.quota_halted);
        assert!(scheduler.cancellation().is_cancelled());
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.not_started, 3);
        assert_eq!(provider.call_count(), 1);
        assert!(read_records(&output).is_empty());
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        let provider = MockProvider::new(r#"{"details": {"owner": "A Org"}}"#);
        let all = links(3);
        let scheduler = scheduler(&provider, &all, &output, 2);
        scheduler.cancellation().cancel();

        let metrics = scheduler.run(all).await.unwrap();
        assert_eq!(metrics.not_started, 3);
        assert_eq!(provider.call_count(), 0);
    }
}
