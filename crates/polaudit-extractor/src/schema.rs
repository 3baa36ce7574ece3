//! Field descriptors for each document type
//!
//! One table per document type drives both the JSON schema sent to
//! schema-constrained models and the sanitizer's allowed-key narrowing.

use polaudit_domain::{DocType, Rights};
use serde_json::{json, Map, Value};

/// Shape of one details field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string, empty when not stated
    Text,
    /// String or null when not stated
    OptionalText,
    /// List of strings
    List,
    /// Tri-state boolean
    Flag,
    /// `NONE` / `INTRA_EU` / `INTERNATIONAL` or null
    Scope,
    /// `FIRST` / `THIRD` / `MIXED` or null
    Ownership,
    /// Map of the seven data-subject rights
    Rights,
    /// Cookie lifetime object
    Duration,
}

/// One field of a details object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name
    pub name: &'static str,
    /// Shape
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

const PRIVACY: &[FieldSpec] = &[
    field("controller", FieldKind::Text),
    field("dpo_contact", FieldKind::Text),
    field("purposes", FieldKind::List),
    field("legal_bases", FieldKind::List),
    field("source_of_data", FieldKind::Text),
    field("retention", FieldKind::Text),
    field("recipients", FieldKind::List),
    field("transfer_scope", FieldKind::Scope),
    field("rights", FieldKind::Rights),
    field("rights_general_statement", FieldKind::Flag),
    field("automated_decisions", FieldKind::Flag),
];

const COOKIE: &[FieldSpec] = &[
    field("ownership", FieldKind::Ownership),
    field("third_parties", FieldKind::List),
    field("types", FieldKind::List),
    field("purpose", FieldKind::List),
    field("duration", FieldKind::Duration),
    field("consent_mechanism", FieldKind::OptionalText),
    field("mgmt_instructions", FieldKind::Flag),
];

const LEGAL_NOTICE: &[FieldSpec] = &[
    field("owner", FieldKind::Text),
    field("contact", FieldKind::Text),
    field("ip_notice", FieldKind::Flag),
    field("liability_clause", FieldKind::Flag),
    field("applicable_law", FieldKind::Text),
];

const DATA_PROTECTION: &[FieldSpec] = &[
    field("dpo_contact", FieldKind::Text),
    field("rights", FieldKind::Rights),
    field("rights_general_statement", FieldKind::Flag),
    field("source_of_data", FieldKind::Text),
    field("retention", FieldKind::Text),
    field("recipients", FieldKind::List),
    field("transfer_scope", FieldKind::Scope),
    field("automated_decisions", FieldKind::Flag),
    field("complaint_authority", FieldKind::Flag),
];

/// Fields of the details object for `doc_type`, in wire order
pub fn fields(doc_type: DocType) -> &'static [FieldSpec] {
    match doc_type {
        DocType::PrivacyPolicy => PRIVACY,
        DocType::CookiePolicy => COOKIE,
        DocType::LegalNotice => LEGAL_NOTICE,
        DocType::DataProtection => DATA_PROTECTION,
    }
}

fn flag_schema() -> Value {
    json!({"type": "boolean", "nullable": true})
}

fn kind_schema(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => json!({"type": "string"}),
        FieldKind::OptionalText => json!({"type": "string", "nullable": true}),
        FieldKind::List => json!({"type": "array", "items": {"type": "string"}}),
        FieldKind::Flag => flag_schema(),
        FieldKind::Scope => json!({
            "type": "string",
            "nullable": true,
            "enum": ["NONE", "INTRA_EU", "INTERNATIONAL"]
        }),
        FieldKind::Ownership => json!({
            "type": "string",
            "nullable": true,
            "enum": ["FIRST", "THIRD", "MIXED"]
        }),
        FieldKind::Rights => {
            let properties: Map<String, Value> = Rights::FIELDS
                .iter()
                .map(|name| (name.to_string(), flag_schema()))
                .collect();
            json!({"type": "object", "properties": properties})
        }
        FieldKind::Duration => json!({
            "type": "object",
            "properties": {
                "session": flag_schema(),
                "persistent": flag_schema(),
                "max_exp": {"type": "string", "nullable": true}
            }
        }),
    }
}

/// Schema of the details object for `doc_type`
pub fn details_schema(doc_type: DocType) -> Value {
    let properties: Map<String, Value> = fields(doc_type)
        .iter()
        .map(|f| (f.name.to_string(), kind_schema(f.kind)))
        .collect();
    json!({"type": "object", "properties": properties})
}

/// Schema of a full model reply: `{"details": {...}, "last_update": "..."}`
pub fn response_schema(doc_type: DocType) -> Value {
    json!({
        "type": "object",
        "properties": {
            "details": details_schema(doc_type),
            "last_update": {"type": "string"}
        },
        "required": ["details"]
    })
}
