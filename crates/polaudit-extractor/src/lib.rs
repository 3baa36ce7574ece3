//! polaudit Extractor
//!
//! Turns the text of a legal document into one validated, merged
//! [`DocumentRecord`](polaudit_domain::DocumentRecord).
//!
//! # Overview
//!
//! Documents are split into overlapping word windows. Each window is sent to
//! a language model with a prompt asking for the details object of the
//! document's type; the reply is parsed, coerced into the strict shape,
//! validated, and folded into the document's accumulator with the monotone
//! merge of `polaudit-domain`.
//!
//! # Architecture
//!
//! ```text
//! Link → fetch → chunk → prompt → ExtractionClient → parse → sanitize → validate → merge
//!                                      │
//!                        RateLimiter · ModelCascade · RetryPolicy
//! ```
//!
//! # Key Features
//!
//! - **Rate limiting**: one limiter shared by every worker, per second and per minute
//! - **Model cascade**: quota exhaustion steps down to weaker models, then halts the run
//! - **Structured output**: schema-constrained calls with a freeform fallback
//! - **Localized prompts**: Spanish and English field definitions, jurisdiction hints
//!
//! # Example Usage
//!
//! ```
//! use polaudit_domain::{CancellationToken, DocType, Link};
//! use polaudit_extractor::{
//!     DocumentAuditor, ExtractionClient, ExtractorConfig, HostJurisdictionAdvisor,
//!     ModelCascade, RateLimiter,
//! };
//! use polaudit_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let client = ExtractionClient::new(
//!     Arc::new(MockProvider::new(r#"{"details": {"owner": "Example Org"}}"#)),
//!     Arc::new(RateLimiter::new(60, 10)),
//!     Arc::new(ModelCascade::new(config.model_cascade.clone())?),
//!     config.retry_policy(),
//!     CancellationToken::new(),
//! );
//! let auditor = DocumentAuditor::new(client, NoFetch, Arc::new(HostJurisdictionAdvisor), &config)?;
//!
//! let link = Link::new("example.org", "https://example.org/legal", DocType::LegalNotice);
//! let outcome = auditor.audit_text(&link, "Example Org owns this website.")?;
//! assert!(outcome.record().is_some());
//! # Ok(())
//! # }
//! # struct NoFetch;
//! # impl polaudit_domain::DocumentFetcher for NoFetch {
//! #     fn fetch(&self, _: &str, _: Option<&str>) -> polaudit_domain::FetchedDocument {
//! #         polaudit_domain::FetchedDocument::empty()
//! #     }
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod client;
mod config;
mod error;
mod extractor;
mod jurisdiction;
mod parser;
mod prompt;
mod rate_limit;
mod sanitize;
mod schema;
mod types;


pub use chunking::TextChunker;
pub use client::{Attempt, CallOutcome, ExtractionClient, ModelCascade, Observation, RetryPolicy};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::DocumentAuditor;
pub use jurisdiction::{infer_code, HostJurisdictionAdvisor, GENERIC};
pub use parser::{find_balanced_json, parse_freeform, parse_structured};
pub use prompt::{PromptBuilder, PromptLanguage};
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use sanitize::sanitize;
pub use schema::{details_schema, fields, response_schema, FieldKind, FieldSpec};
pub use types::{AuditOutcome, ChunkStats, Prompt, RawExtraction};
