//! Identity hash module - content-addressed keys for audited documents

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Hash function used to derive a document's identity from its URL
///
/// The identity is both the primary key of a `DocumentRecord` and the
/// resume key: a URL whose identity already appears in the output store is
/// never audited again. Changing the function between runs invalidates the
/// skip set, so the choice is part of the run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityHash {
    /// SHA-1, hex encoded (40 chars). Compatible with existing output stores.
    #[default]
    Sha1,

    /// SHA-256, hex encoded (64 chars)
    Sha256,
}

impl IdentityHash {
    /// Compute the identity of a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use polaudit_domain::IdentityHash;
    ///
    /// let id = IdentityHash::Sha1.digest("https://example.org/privacy");
    /// assert_eq!(id.len(), 40);
    /// assert_eq!(id, IdentityHash::Sha1.digest("https://example.org/privacy"));
    /// ```
    pub fn digest(&self, url: &str) -> String {
        match self {
            IdentityHash::Sha1 => hex::encode(Sha1::digest(url.as_bytes())),
            IdentityHash::Sha256 => hex::encode(Sha256::digest(url.as_bytes())),
        }
    }

    /// Get the configuration name of the hash function
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityHash::Sha1 => "sha1",
            IdentityHash::Sha256 => "sha256",
        }
    }
}

impl std::str::FromStr for IdentityHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(IdentityHash::Sha1),
            "sha256" => Ok(IdentityHash::Sha256),
            other => Err(format!("Invalid identity hash: {}", other)),
        }
    }
}
