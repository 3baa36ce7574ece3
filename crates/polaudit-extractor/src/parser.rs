//! Parse model replies into raw details objects

use crate::types::RawExtraction;
use serde_json::Value;

/// First balanced `{...}` object in `text`
///
/// Braces inside JSON strings (including escaped quotes) are ignored.
/// Returns `None` when no object opens or the first one never closes.
pub fn find_balanced_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove a surrounding markdown code fence, handling ```json and bare ```
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a schema-constrained reply
///
/// The reply should be a JSON document by construction; fenced or chatty
/// replies fall back to balanced-object scanning.
pub fn parse_structured(response: &str) -> Option<RawExtraction> {
    let body = strip_code_fence(response);
    match serde_json::from_str::<Value>(body) {
        Ok(value) => unwrap_envelope(value),
        Err(_) => parse_freeform(body),
    }
}

/// Parse a freeform reply: the first balanced JSON object found in the text
pub fn parse_freeform(response: &str) -> Option<RawExtraction> {
    let candidate = find_balanced_json(response)?;
    serde_json::from_str::<Value>(candidate)
        .ok()
        .and_then(unwrap_envelope)
}

/// Accept both `{"details": {...}, "last_update": ...}` and a bare details object
pub fn unwrap_envelope(value: Value) -> Option<RawExtraction> {
    let Value::Object(mut outer) = value else {
        return None;
    };

    let envelope_date = take_date(outer.get("last_update"));
    match outer.remove("details") {
        Some(Value::Object(details)) => {
            let last_update = envelope_date.or_else(|| take_date(details.get("last_update")));
            Some(RawExtraction {
                details: Value::Object(details),
                last_update,
            })
        }
        // A non-object `details` means the model got the shape wrong; the
        // sanitizer turns it into empty details.
        Some(other) => Some(RawExtraction {
            details: other,
            last_update: envelope_date,
        }),
        None => Some(RawExtraction {
            details: Value::Object(outer),
            last_update: envelope_date,
        }),
    }
}

fn take_date(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_balanced_ignores_braces_in_strings() {
        let text = r#"Sure! {"owner": "Acme {Spain}", "note": "a \"quoted\" } brace"} trailing }"#;
        let found = find_balanced_json(text).unwrap();
        assert_eq!(
            found,
            r#"{"owner": "Acme {Spain}", "note": "a \"quoted\" } brace"}"#
        );
        assert!(serde_json::from_str::<Value>(found).is_ok());
    }

    #[test]
    fn test_balanced_nested_objects() {
        let text = r#"x {"a": {"b": {}}, "c": 1} y {"d": 2}"#;
        assert_eq!(find_balanced_json(text), Some(r#"{"a": {"b": {}}, "c": 1}"#));
    }

    #[test]
    fn test_balanced_missing_or_unclosed() {
        assert_eq!(find_balanced_json("no json here"), None);
        assert_eq!(find_balanced_json(r#"{"a": {"b": 1}"#), None);
    }

    #[test]
    fn test_balanced_handles_multibyte_text() {
        let text = "Aquí está: {\"controller\": \"Ayuntamiento de Cádiz\"} ¿vale?";
        assert_eq!(
            find_balanced_json(text),
            Some("{\"controller\": \"Ayuntamiento de Cádiz\"}")
        );
    }

    #[test]
    fn test_extract_json_from_markdown() {
        let response = "```json\n{\"details\": {\"owner\": \"x\"}}\n```";
        let raw = parse_structured(response).unwrap();
        assert_eq!(raw.details, json!({"owner": "x"}));
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"owner\": \"x\"}\n```";
        let raw = parse_structured(response).unwrap();
        assert_eq!(raw.details, json!({"owner": "x"}));
    }

    #[test]
    fn test_envelope_and_bare_details() {
        let raw = unwrap_envelope(json!({"details": {"owner": "x"}, "last_update": "2023-05-01"}))
            .unwrap();
        assert_eq!(raw.details, json!({"owner": "x"}));
        assert_eq!(raw.last_update.as_deref(), Some("2023-05-01"));

        let raw = unwrap_envelope(json!({"owner": "x", "last_update": " "})).unwrap();
        assert_eq!(raw.details["owner"], json!("x"));
        assert_eq!(raw.last_update, None);
    }

    #[test]
    fn test_date_inside_details() {
        let raw = unwrap_envelope(json!({"details": {"owner": "x", "last_update": "enero 2024"}}))
            .unwrap();
        assert_eq!(raw.last_update.as_deref(), Some("enero 2024"));
    }

    #[test]
    fn test_non_object_reply() {
        assert!(unwrap_envelope(json!([1, 2])).is_none());
        assert!(parse_structured("\"just a string\"").is_none());
    }

    #[test]
    fn test_freeform_with_prose() {
        let response = "Here is the analysis:\n{\"details\": {\"ip_notice\": true}}\nLet me know!";
        let raw = parse_freeform(response).unwrap();
        assert_eq!(raw.details, json!({"ip_notice": true}));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_freeform("This is not JSON").is_none());
        assert!(parse_structured("This is not JSON").is_none());
    }
}
