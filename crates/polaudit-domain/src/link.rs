//! Link module - a document scheduled for audit

use crate::{DocType, IdentityHash};
use serde::{Deserialize, Serialize};

/// A legal document to audit
///
/// Links are produced upstream (policy discovery) and read once from the
/// input stream. They are immutable; one link spawns at most one audit task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Registrable domain the document belongs to
    pub domain: String,

    /// Absolute URL of the document
    pub url: String,

    /// Category of the document
    pub doc_type: DocType,

    /// Anchor text the link was discovered under
    #[serde(default)]
    pub anchor_text: Option<String>,

    /// Detected language of the document (ISO 639-1, e.g. "es")
    #[serde(default)]
    pub lang: Option<String>,
}

impl Link {
    /// Create a link without anchor text or language
    pub fn new(domain: impl Into<String>, url: impl Into<String>, doc_type: DocType) -> Self {
        Self {
            domain: domain.into(),
            url: url.into(),
            doc_type,
            anchor_text: None,
            lang: None,
        }
    }

    /// Set the document language
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Identity of this link under the given hash function
    pub fn identity(&self, hash: IdentityHash) -> String {
        hash.digest(&self.url)
    }
}
