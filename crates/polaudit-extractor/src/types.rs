//! Request and result types for document audits

use polaudit_domain::{DocType, DocumentRecord};
use serde_json::Value;

/// A model reply reduced to its details object
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtraction {
    /// Unsanitized details object (or whatever the model put in its place)
    pub details: Value,

    /// Revision date stated by the model, if any
    pub last_update: Option<String>,
}

/// A fully built extraction prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Text sent to the model
    pub text: String,

    /// Reply schema for schema-constrained generation
    pub schema: Value,

    /// Document type the prompt asks about
    pub doc_type: DocType,
}

/// How the chunks of one document fared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Chunks the document was split into
    pub total: usize,

    /// Chunks whose details were merged into the record
    pub merged: usize,

    /// Chunks with no usable reply (retries exhausted or unparseable)
    pub no_reply: usize,

    /// Chunks whose reply failed validation
    pub invalid: usize,

    /// Chunks that validated but stated nothing
    pub empty: usize,
}

/// Result of auditing one link
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    /// At least one chunk contributed facts
    Recorded {
        /// Record to persist
        record: DocumentRecord,
        /// Whether the run was cancelled before every chunk was processed
        partial: bool,
        /// Per-chunk accounting
        stats: ChunkStats,
    },

    /// Every chunk was processed and none contributed facts
    NoFacts {
        /// Per-chunk accounting
        stats: ChunkStats,
    },

    /// The document could not be fetched or had no text
    FetchFailed,

    /// The run was cancelled before any chunk contributed
    Cancelled,
}

impl AuditOutcome {
    /// The record to persist, if any
    pub fn record(&self) -> Option<&DocumentRecord> {
        match self {
            AuditOutcome::Recorded { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            AuditOutcome::Recorded { partial: false, .. } => "recorded",
            AuditOutcome::Recorded { partial: true, .. } => "partial",
            AuditOutcome::NoFacts { .. } => "no_facts",
            AuditOutcome::FetchFailed => "fetch_failed",
            AuditOutcome::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polaudit_domain::{Details, IdentityHash, Link};

    #[test]
    fn test_outcome_labels() {
        let link = Link::new("a.org", "https://a.org/legal", DocType::LegalNotice);
        let record = DocumentRecord::new(
            &link,
            Details::empty(DocType::LegalNotice),
            None,
            IdentityHash::Sha1,
        );
        let partial = AuditOutcome::Recorded {
            record,
            partial: true,
            stats: ChunkStats::default(),
        };
        assert_eq!(partial.label(), "partial");
        assert!(partial.record().is_some());
        assert_eq!(AuditOutcome::FetchFailed.label(), "fetch_failed");
        assert!(AuditOutcome::Cancelled.record().is_none());
    }
}
