//! Core document audit: fetch, chunk, extract, validate, merge

use crate::chunking::TextChunker;
use crate::client::ExtractionClient;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::PromptBuilder;
use crate::sanitize::sanitize;
use crate::types::{AuditOutcome, ChunkStats};
use polaudit_domain::traits::{DocumentFetcher, JurisdictionAdvisor, LlmProvider};
use polaudit_domain::{Details, DocumentRecord, IdentityHash, Link};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Audits one document at a time
///
/// Chunks of a document are processed strictly in order, so that merges
/// happen in chunk order. Different documents may be audited concurrently
/// through a shared auditor.
pub struct DocumentAuditor<P, F> {
    client: ExtractionClient<P>,
    fetcher: F,
    advisor: Arc<dyn JurisdictionAdvisor + Send + Sync>,
    chunker: TextChunker,
    max_prompt_chars: usize,
    identity_hash: IdentityHash,
}

impl<P, F> DocumentAuditor<P, F>
where
    P: LlmProvider + Send + Sync,
    F: DocumentFetcher,
{
    /// Create a new auditor
    pub fn new(
        client: ExtractionClient<P>,
        fetcher: F,
        advisor: Arc<dyn JurisdictionAdvisor + Send + Sync>,
        config: &ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            client,
            fetcher,
            advisor,
            chunker: config.chunker()?,
            max_prompt_chars: config.max_prompt_chars,
            identity_hash: IdentityHash::default(),
        })
    }

    /// Use `hash` for record identities
    pub fn with_identity_hash(mut self, hash: IdentityHash) -> Self {
        self.identity_hash = hash;
        self
    }

    /// The extraction client shared by this auditor
    pub fn client(&self) -> &ExtractionClient<P> {
        &self.client
    }

    /// Fetch and audit `link`
    ///
    /// Only quota exhaustion on every model tier is an error; it discards
    /// whatever this document had accumulated.
    pub fn audit(&self, link: &Link) -> Result<AuditOutcome, ExtractorError> {
        if self.client.cancellation().is_cancelled() {
            return Ok(AuditOutcome::Cancelled);
        }

        let document = self.fetcher.fetch(&link.url, link.lang.as_deref());
        if document.is_empty() {
            warn!(url = %link.url, "Could not obtain document text");
            return Ok(AuditOutcome::FetchFailed);
        }
        debug!(url = %link.url, mime = %document.mime, chars = document.text.len(), "Fetched document");

        self.audit_text(link, &document.text)
    }

    /// Audit already-fetched `text` as the content of `link`
    pub fn audit_text(&self, link: &Link, text: &str) -> Result<AuditOutcome, ExtractorError> {
        let doc_type = link.doc_type;
        let lang = link.lang.as_deref();
        let chunks = self.chunker.chunk(text);
        let jurisdiction = self.advisor.advise(&link.url, lang);

        let mut stats = ChunkStats {
            total: chunks.len(),
            ..Default::default()
        };
        if chunks.is_empty() {
            return Ok(AuditOutcome::NoFacts { stats });
        }

        info!(
            url = %link.url,
            doc_type = %doc_type,
            jurisdiction = %jurisdiction,
            chunks = chunks.len(),
            "Auditing document"
        );

        let mut merged: Option<Details> = None;
        let mut last_update: Option<String> = None;
        let mut interrupted = false;

        for (idx, chunk) in chunks.iter().enumerate() {
            if self.client.cancellation().is_cancelled() {
                interrupted = true;
                break;
            }

            let prompt = PromptBuilder::new(doc_type, chunk)
                .with_language(lang)
                .with_jurisdiction_hint(&jurisdiction.hint)
                .with_max_chars(self.max_prompt_chars)
                .build();

            let Some(raw) = self.client.extract(&prompt)? else {
                if self.client.cancellation().is_cancelled() {
                    interrupted = true;
                    break;
                }
                stats.no_reply += 1;
                continue;
            };

            let clean = sanitize(doc_type, &raw.details);
            let details = match Details::from_value(doc_type, clean) {
                Ok(details) => details,
                Err(e) => {
                    warn!(url = %link.url, chunk = idx, error = %e, "Chunk failed validation, skipping");
                    stats.invalid += 1;
                    continue;
                }
            };
            if details.is_empty() {
                debug!(url = %link.url, chunk = idx, "Chunk stated nothing");
                stats.empty += 1;
                continue;
            }

            merged = Some(match merged {
                None => details,
                Some(acc) => acc.merge(&details)?,
            });
            stats.merged += 1;
            if last_update.is_none() {
                last_update = raw.last_update;
            }
        }

        let outcome = match merged {
            Some(details) => AuditOutcome::Recorded {
                record: DocumentRecord::new(link, details, last_update, self.identity_hash),
                partial: interrupted,
                stats,
            },
            None if interrupted => AuditOutcome::Cancelled,
            None => AuditOutcome::NoFacts { stats },
        };
        info!(url = %link.url, outcome = outcome.label(), merged = stats.merged, total = stats.total, "Document audited");
        Ok(outcome)
    }
}

impl<P, F> std::fmt::Debug for DocumentAuditor<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAuditor")
            .field("client", &self.client)
            .field("chunker", &self.chunker)
            .field("identity_hash", &self.identity_hash)
            .finish()
    }
}
