//! Details module - the typed facts extracted for each document type
//!
//! Field classes follow one convention across all variants:
//! - plain scalars are `String`, where the empty string means "not stated"
//! - tri-state booleans are `Option<bool>` (`None` = not stated)
//! - lists are `Vec<String>`, order of first appearance, no duplicates
//! - ranked enums are `Option<TransferScope>` / `Option<Ownership>`

use crate::merge::Merge;
use crate::DocType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Geographic scope of personal-data transfers
///
/// Variants are declared in rank order: `NoTransfers < IntraEu < International`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransferScope {
    /// No transfers outside the controller are mentioned
    #[serde(rename = "NONE")]
    NoTransfers,

    /// Transfers only within the EU/EEA
    #[serde(rename = "INTRA_EU")]
    IntraEu,

    /// Transfers to countries outside the EEA
    #[serde(rename = "INTERNATIONAL")]
    International,
}

impl TransferScope {
    /// Ordinal used by the merge (`NONE` = 1 .. `INTERNATIONAL` = 3)
    pub fn rank(&self) -> u8 {
        match self {
            TransferScope::NoTransfers => 1,
            TransferScope::IntraEu => 2,
            TransferScope::International => 3,
        }
    }

    /// Parse a wire value (case-insensitive, tolerant of `-` and spaces)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "NONE" => Some(TransferScope::NoTransfers),
            "INTRA_EU" | "INTRA_EEA" => Some(TransferScope::IntraEu),
            "INTERNATIONAL" => Some(TransferScope::International),
            _ => None,
        }
    }
}

/// Who sets the cookies described by a cookie policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ownership {
    /// Only first-party cookies
    First,

    /// Only third-party cookies
    Third,

    /// Both first- and third-party cookies
    Mixed,
}

impl Ownership {
    /// Parse a wire value (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FIRST" | "FIRST_PARTY" => Some(Ownership::First),
            "THIRD" | "THIRD_PARTY" => Some(Ownership::Third),
            "MIXED" | "BOTH" => Some(Ownership::Mixed),
            _ => None,
        }
    }
}

/// Data-subject rights named by the document
///
/// Only positive mentions carry meaning: a right that is not named is `None`,
/// never `Some(false)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rights {
    /// Right of access
    pub access: Option<bool>,
    /// Right to rectification
    pub rectification: Option<bool>,
    /// Right to erasure
    pub erasure: Option<bool>,
    /// Right to object
    pub opposition: Option<bool>,
    /// Right to data portability
    pub portability: Option<bool>,
    /// Right to restriction of processing
    pub restriction: Option<bool>,
    /// Right not to be subject to automated individual decisions
    pub no_individual_decision: Option<bool>,
}

impl Rights {
    /// Names of the seven rights, in wire order
    pub const FIELDS: [&'static str; 7] = [
        "access",
        "rectification",
        "erasure",
        "opposition",
        "portability",
        "restriction",
        "no_individual_decision",
    ];
}

/// Predominant lifetime of the cookies in a cookie policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieDuration {
    /// Session cookies are used
    pub session: Option<bool>,
    /// Persistent cookies are used
    pub persistent: Option<bool>,
    /// Longest stated expiry ("30d", "1y", "until_logout", ...)
    pub max_exp: Option<String>,
}

/// Facts extracted from a privacy policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrivacyDetails {
    /// Entity responsible for the processing
    pub controller: String,
    /// Contact of the data protection officer or privacy desk
    pub dpo_contact: String,
    /// Stated processing purposes
    pub purposes: Vec<String>,
    /// Legal bases, as worded in the document
    pub legal_bases: Vec<String>,
    /// Source of data not collected from the subject
    pub source_of_data: String,
    /// Retention period or criterion
    pub retention: String,
    /// Recipients or categories of recipients
    pub recipients: Vec<String>,
    /// Widest transfer scope mentioned
    pub transfer_scope: Option<TransferScope>,
    /// Data-subject rights named
    pub rights: Rights,
    /// Rights are only mentioned as a block, without listing them
    pub rights_general_statement: Option<bool>,
    /// Profiling or solely automated decisions are mentioned
    pub automated_decisions: Option<bool>,
}

/// Facts extracted from a cookie policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieDetails {
    /// Cookie ownership
    pub ownership: Option<Ownership>,
    /// Named third-party cookie providers
    pub third_parties: Vec<String>,
    /// Cookie categories
    pub types: Vec<String>,
    /// Stated cookie purposes
    pub purpose: Vec<String>,
    /// Cookie lifetime
    pub duration: CookieDuration,
    /// How consent is collected (banner, cmp, scroll, none)
    pub consent_mechanism: Option<String>,
    /// Instructions to manage or disable cookies are given
    pub mgmt_instructions: Option<bool>,
}

/// Facts extracted from a legal notice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegalNoticeDetails {
    /// Owner of the website
    pub owner: String,
    /// General contact of the owner
    pub contact: String,
    /// Intellectual-property notice present
    pub ip_notice: Option<bool>,
    /// Liability disclaimer present
    pub liability_clause: Option<bool>,
    /// Governing law and competent courts
    pub applicable_law: String,
}

/// Facts extracted from a data-protection notice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataProtectionDetails {
    /// Contact of the data protection officer or privacy desk
    pub dpo_contact: String,
    /// Data-subject rights named
    pub rights: Rights,
    /// Rights are only mentioned as a block, without listing them
    pub rights_general_statement: Option<bool>,
    /// Source of data not collected from the subject
    pub source_of_data: String,
    /// Retention period or criterion
    pub retention: String,
    /// Recipients or categories of recipients
    pub recipients: Vec<String>,
    /// Widest transfer scope mentioned
    pub transfer_scope: Option<TransferScope>,
    /// Profiling or solely automated decisions are mentioned
    pub automated_decisions: Option<bool>,
    /// Right to complain to a supervisory authority is mentioned
    pub complaint_authority: Option<bool>,
}

/// Facts for one document, tagged by document type
///
/// Serializes as the bare inner object; the document type travels next to
/// it in the `DocumentRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Details {
    /// Privacy policy facts
    Privacy(PrivacyDetails),
    /// Cookie policy facts
    Cookie(CookieDetails),
    /// Legal notice facts
    LegalNotice(LegalNoticeDetails),
    /// Data-protection notice facts
    DataProtection(DataProtectionDetails),
}

impl Details {
    /// An accumulator with every field unset
    pub fn empty(doc_type: DocType) -> Self {
        match doc_type {
            DocType::PrivacyPolicy => Details::Privacy(PrivacyDetails::default()),
            DocType::CookiePolicy => Details::Cookie(CookieDetails::default()),
            DocType::LegalNotice => Details::LegalNotice(LegalNoticeDetails::default()),
            DocType::DataProtection => Details::DataProtection(DataProtectionDetails::default()),
        }
    }

    /// Validate a JSON object against the strict schema of `doc_type`
    ///
    /// Unknown keys and wrongly typed values are rejected.
    pub fn from_value(doc_type: DocType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match doc_type {
            DocType::PrivacyPolicy => Details::Privacy(serde_json::from_value(value)?),
            DocType::CookiePolicy => Details::Cookie(serde_json::from_value(value)?),
            DocType::LegalNotice => Details::LegalNotice(serde_json::from_value(value)?),
            DocType::DataProtection => Details::DataProtection(serde_json::from_value(value)?),
        })
    }

    /// Document type this value belongs to
    pub fn doc_type(&self) -> DocType {
        match self {
            Details::Privacy(_) => DocType::PrivacyPolicy,
            Details::Cookie(_) => DocType::CookiePolicy,
            Details::LegalNotice(_) => DocType::LegalNotice,
            Details::DataProtection(_) => DocType::DataProtection,
        }
    }

    /// Whether no fact at all is stated
    pub fn is_empty(&self) -> bool {
        *self == Details::empty(self.doc_type())
    }

    /// Fold `other` into `self`, returning the merged value
    ///
    /// Both operands must be of the same document type.
    pub fn merge(&self, other: &Details) -> Result<Details, DocTypeMismatch> {
        match (self, other) {
            (Details::Privacy(a), Details::Privacy(b)) => Ok(Details::Privacy(a.merge(b))),
            (Details::Cookie(a), Details::Cookie(b)) => Ok(Details::Cookie(a.merge(b))),
            (Details::LegalNotice(a), Details::LegalNotice(b)) => {
                Ok(Details::LegalNotice(a.merge(b)))
            }
            (Details::DataProtection(a), Details::DataProtection(b)) => {
                Ok(Details::DataProtection(a.merge(b)))
            }
            _ => Err(DocTypeMismatch {
                expected: self.doc_type(),
                found: other.doc_type(),
            }),
        }
    }
}

/// Attempt to merge details of two different document types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocTypeMismatch {
    /// Type of the accumulator
    pub expected: DocType,
    /// Type of the value being merged in
    pub found: DocType,
}

impl fmt::Display for DocTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot merge {} details into {} details",
            self.found, self.expected
        )
    }
}

impl std::error::Error for DocTypeMismatch {}
