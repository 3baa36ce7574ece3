//! polaudit Domain Layer
//!
//! This crate contains the core model of a compliance audit: the documents to
//! audit, the structured facts extracted from them, and the laws used to fold
//! partial extractions into one record per document.
//!
//! ## Key Concepts
//!
//! - **Link**: A legal document to audit (domain, URL, document type)
//! - **Details**: The typed facts for one document type (privacy, cookies, ...)
//! - **Merge**: Monotone folding of per-chunk facts into a document-level record
//! - **DocumentRecord**: The persisted output, keyed by an identity hash of the URL
//! - **CancellationToken**: Write-once stop flag shared by every audit task
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Only serialization and hashing dependencies
//! - Pure data and merge logic, no I/O
//! - Trait definitions for all external collaborators (model provider,
//!   document fetcher, jurisdiction advisor)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod details;
pub mod doc_type;
pub mod identity;
pub mod link;
pub mod merge;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use details::{
    CookieDetails, CookieDuration, DataProtectionDetails, Details, DocTypeMismatch,
    LegalNoticeDetails, Ownership, PrivacyDetails, Rights, TransferScope,
};
pub use doc_type::DocType;
pub use identity::IdentityHash;
pub use link::Link;
pub use merge::Merge;
pub use record::{DocumentRecord, NO_DATE};
pub use traits::{
    DocumentFetcher, FailureKind, FetchedDocument, Jurisdiction, JurisdictionAdvisor, LlmProvider,
    ProviderError,
};
