//! Record module - the persisted result of one document audit

use crate::{Details, DocType, IdentityHash, Link};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `last_update` value used when no chunk reported a revision date
pub const NO_DATE: &str = "NO_DATE";

/// One line of the output store
///
/// `sha1` is the identity of `url` under the run's configured hash function;
/// the field keeps its historical name whichever function produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct DocumentRecord {
    /// Registrable domain the document belongs to
    pub domain: String,
    /// Absolute URL of the document
    pub url: String,
    /// Category of the document
    pub doc_type: DocType,
    /// Language of the document, if known
    pub lang: Option<String>,
    /// Revision date stated by the document, or [`NO_DATE`]
    pub last_update: String,
    /// Merged facts
    pub details: Details,
    /// Identity hash of `url`
    pub sha1: String,
}

impl DocumentRecord {
    /// Finalize an accumulator for `link`
    pub fn new(link: &Link, details: Details, last_update: Option<String>, hash: IdentityHash) -> Self {
        let last_update = last_update
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| NO_DATE.to_string());

        Self {
            domain: link.domain.clone(),
            url: link.url.clone(),
            doc_type: link.doc_type,
            lang: link.lang.clone(),
            last_update,
            details,
            sha1: link.identity(hash),
        }
    }
}

/// Wire shape before the details object is validated against `doc_type`
#[derive(Deserialize)]
struct RawRecord {
    domain: String,
    url: String,
    doc_type: DocType,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    last_update: Option<String>,
    details: Value,
    sha1: String,
}

impl TryFrom<RawRecord> for DocumentRecord {
    type Error = serde_json::Error;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let details = Details::from_value(raw.doc_type, raw.details)?;
        Ok(Self {
            domain: raw.domain,
            url: raw.url,
            doc_type: raw.doc_type,
            lang: raw.lang,
            last_update: raw.last_update.unwrap_or_else(|| NO_DATE.to_string()),
            details,
            sha1: raw.sha1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrivacyDetails, Rights};
    use serde_json::json;

    fn privacy_link() -> Link {
        Link::new("example.es", "https://example.es/privacidad", DocType::PrivacyPolicy)
            .with_lang("es")
    }

    #[test]
    fn test_new_fills_identity_and_no_date() {
        let record = DocumentRecord::new(
            &privacy_link(),
            Details::empty(DocType::PrivacyPolicy),
            None,
            IdentityHash::Sha1,
        );
        assert_eq!(record.last_update, NO_DATE);
        assert_eq!(record.sha1, IdentityHash::Sha1.digest("https://example.es/privacidad"));
        assert_eq!(record.lang.as_deref(), Some("es"));
    }

    #[test]
    fn test_blank_last_update_becomes_no_date() {
        let record = DocumentRecord::new(
            &privacy_link(),
            Details::empty(DocType::PrivacyPolicy),
            Some("  ".into()),
            IdentityHash::Sha1,
        );
        assert_eq!(record.last_update, NO_DATE);
    }

    #[test]
    fn test_serialized_line_shape() {
        let details = Details::Privacy(PrivacyDetails {
            rights: Rights {
                access: Some(true),
                erasure: Some(true),
                ..Default::default()
            },
            ..Default::default()
        });
        let record = DocumentRecord::new(
            &privacy_link(),
            details,
            Some("2024-03-01".into()),
            IdentityHash::Sha1,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["doc_type"], json!("PRIVACY_POLICY"));
        assert_eq!(value["last_update"], json!("2024-03-01"));
        assert_eq!(
            value["details"]["rights"],
            json!({
                "access": true,
                "rectification": null,
                "erasure": true,
                "opposition": null,
                "portability": null,
                "restriction": null,
                "no_individual_decision": null
            })
        );
    }

    #[test]
    fn test_line_reads_back() {
        let record = DocumentRecord::new(
            &privacy_link(),
            Details::empty(DocType::PrivacyPolicy),
            None,
            IdentityHash::Sha256,
        );
        let line = serde_json::to_string(&record).unwrap();
        let parsed: DocumentRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_details_must_match_doc_type() {
        let line = json!({
            "domain": "a.org",
            "url": "https://a.org/cookies",
            "doc_type": "COOKIE_POLICY",
            "lang": null,
            "last_update": "NO_DATE",
            "details": {"controller": "A Org"},
            "sha1": "x"
        });
        assert!(serde_json::from_value::<DocumentRecord>(line).is_err());
    }
}
