//! Polaudit Runner
//!
//! Batch execution of document audits: reading the link list, skipping
//! documents already audited, running audits concurrently and appending one
//! record per document to the output store.
//!
//! # Overview
//!
//! The runner is responsible for:
//! - **Input**: Parsing the newline-delimited link list, tolerating noise around each object
//! - **Resume**: Deriving the pending set from the records already in the output store
//! - **Scheduling**: Running one audit task per document across a bounded worker pool
//! - **Persistence**: Appending each record as a single durable line
//! - **Fetching**: Downloading pages over HTTP and reducing HTML to readable text
//! - **Metrics collection**: Counting how every pending document ended up
//!
//! # Architecture
//!
//! Workers share one rate limiter, one model cascade and one cancellation
//! token through the [`DocumentAuditor`](polaudit_extractor::DocumentAuditor).
//! Chunks of a single document are always processed in order by the same
//! task. When the cascade is exhausted the token is cancelled and no further
//! document is dispatched; tasks already running stop at their next chunk
//! boundary and keep whatever they merged.
//!
//! | Outcome | Output line | Counted as |
//! |---------|-------------|------------|
//! | **Recorded** | yes | written |
//! | **Recorded (partial)** | yes | partial |
//! | **NoFacts** | no | no facts |
//! | **FetchFailed** | no | fetch failure |
//! | **Cancelled** | no | cancelled |
//!
//! # Usage
//!
//! ```no_run
//! use polaudit_runner::{read_links, AuditScheduler, OutputStore, ResumeTracker};
//! # use polaudit_domain::IdentityHash;
//! # use polaudit_extractor::DocumentAuditor;
//! # use polaudit_llm::MockProvider;
//! # use polaudit_runner::HttpFetcher;
//! # use std::sync::Arc;
//!
//! # async fn run(auditor: DocumentAuditor<MockProvider, HttpFetcher>) -> Result<(), Box<dyn std::error::Error>> {
//! let links = read_links("links.jsonl".as_ref())?;
//! let tracker = ResumeTracker::load("out.jsonl".as_ref(), IdentityHash::Sha1)?;
//! let pending = tracker.pending(links);
//!
//! let store = Arc::new(OutputStore::open("out.jsonl", true)?);
//! let scheduler = AuditScheduler::new(Arc::new(auditor), store, 4);
//! let metrics = scheduler.run(pending).await?;
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetch;
mod links;
mod metrics;
mod resume;
mod scheduler;
mod store;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use fetch::{accept_language, html_to_text, HttpFetcher};
pub use links::{parse_link_line, read_links, read_links_from};
pub use metrics::RunMetrics;
pub use resume::ResumeTracker;
pub use scheduler::AuditScheduler;
pub use store::OutputStore;
