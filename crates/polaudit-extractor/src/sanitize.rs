//! Coercion of loosely typed model output into the strict details shape
//!
//! Models answer "not mentioned" in many ways: null, an empty object, a
//! localized phrase, a scalar where a list was asked for. Everything here is
//! best effort and total: any input produces an object that deserializes
//! into the document type's details, possibly with every field unset.

use crate::schema::{fields, FieldKind};
use polaudit_domain::{DocType, Ownership, Rights, TransferScope};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static SILENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(no\s+se\s+menciona|no\s+aplica|n/?a|not\s+mentioned|unspecified)\s*\.?$")
        .expect("silence pattern is valid")
});

/// Whether `s` is a "not stated" answer (including blank)
pub fn is_silence(s: &str) -> bool {
    s.trim().is_empty() || SILENCE.is_match(s)
}

/// Sanitize a raw details object for `doc_type`
///
/// Keys outside the document type's field set are dropped; every known
/// field is present in the result.
pub fn sanitize(doc_type: DocType, raw: &Value) -> Value {
    let empty = Map::new();
    let source = raw.as_object().unwrap_or(&empty);

    let mut out = Map::new();
    for spec in fields(doc_type) {
        let value = source.get(spec.name).unwrap_or(&Value::Null);
        let clean = match spec.kind {
            FieldKind::Text => Value::String(to_text(value)),
            FieldKind::OptionalText => to_optional_text(value),
            FieldKind::List => Value::Array(to_list(value).into_iter().map(Value::String).collect()),
            FieldKind::Flag => to_flag(value).map_or(Value::Null, Value::Bool),
            FieldKind::Scope => as_str(value)
                .and_then(TransferScope::parse)
                .map_or(Value::Null, |s| serde_json::to_value(s).unwrap_or(Value::Null)),
            FieldKind::Ownership => as_str(value)
                .and_then(Ownership::parse)
                .map_or(Value::Null, |o| serde_json::to_value(o).unwrap_or(Value::Null)),
            FieldKind::Rights => to_rights(value),
            FieldKind::Duration => to_duration(value),
        };
        out.insert(spec.name.to_string(), clean);
    }
    Value::Object(out)
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !is_silence(s))
}

/// Scalar string; silence and non-scalars become empty
fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) if !is_silence(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) => to_list(value).join("; "),
        _ => String::new(),
    }
}

/// Scalar string or null when nothing is stated
fn to_optional_text(value: &Value) -> Value {
    let text = to_text(value);
    if text.is_empty() {
        Value::Null
    } else {
        Value::String(text)
    }
}

/// List of strings; a scalar becomes a one-element list, an object its values
fn to_list(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Value::String(s) if !is_silence(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !out.contains(&text) {
            out.push(text);
        }
    }
    out
}

/// Tri-state boolean from a bool, a number or a yes/no word
pub fn to_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "sí" | "si" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Rights map with all seven keys; only affirmed rights survive
fn to_rights(value: &Value) -> Value {
    let empty = Map::new();
    let source = value.as_object().unwrap_or(&empty);
    let rights: Map<String, Value> = Rights::FIELDS
        .iter()
        .map(|name| {
            let affirmed = source.get(*name).and_then(to_flag) == Some(true);
            let v = if affirmed { Value::Bool(true) } else { Value::Null };
            (name.to_string(), v)
        })
        .collect();
    Value::Object(rights)
}

fn to_duration(value: &Value) -> Value {
    let empty = Map::new();
    let source = value.as_object().unwrap_or(&empty);
    let flag = |key: &str| source.get(key).and_then(to_flag).map_or(Value::Null, Value::Bool);

    let mut duration = Map::new();
    duration.insert("session".into(), flag("session"));
    duration.insert("persistent".into(), flag("persistent"));
    duration.insert(
        "max_exp".into(),
        source.get("max_exp").map_or(Value::Null, to_optional_text),
    );
    Value::Object(duration)
}
