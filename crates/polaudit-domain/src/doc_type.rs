//! Document type module - the categories of legal documents that can be audited

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a legal document
///
/// The document type decides which `Details` schema the model is asked to
/// fill and which merge rules apply:
/// - PrivacyPolicy: controller, purposes, legal bases, rights, transfers
/// - CookiePolicy: ownership, third parties, cookie types and duration
/// - LegalNotice: site owner, contact, IP and liability clauses
/// - DataProtection: data-protection notice (rights, transfers, complaints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum DocType {
    /// Privacy policy
    PrivacyPolicy,

    /// Cookie policy
    CookiePolicy,

    /// Legal notice (site imprint)
    LegalNotice,

    /// Data-protection notice
    DataProtection,
}

impl DocType {
    /// Every document type, in declaration order
    pub const ALL: [DocType; 4] = [
        DocType::PrivacyPolicy,
        DocType::CookiePolicy,
        DocType::LegalNotice,
        DocType::DataProtection,
    ];

    /// Get the wire name of the document type
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::PrivacyPolicy => "PRIVACY_POLICY",
            DocType::CookiePolicy => "COOKIE_POLICY",
            DocType::LegalNotice => "LEGAL_NOTICE",
            DocType::DataProtection => "DATA_PROTECTION",
        }
    }

    /// Parse a document type from its wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "PRIVACY_POLICY" => Some(DocType::PrivacyPolicy),
            "COOKIE_POLICY" => Some(DocType::CookiePolicy),
            "LEGAL_NOTICE" => Some(DocType::LegalNotice),
            "DATA_PROTECTION" => Some(DocType::DataProtection),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document type: {}", s))
    }
}

impl TryFrom<String> for DocType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
