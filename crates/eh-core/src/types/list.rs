//! Canonical encoding for the list-valued fields of an event (`tags`, `agenda`).
//!
//! Lists are always written as a JSON array of strings. Reads go through
//! [`decode_lenient`], which also accepts a JSON string scalar or bare text
//! (one item) so older rows never have to be re-guessed by callers.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a JSON array of strings: {message}")]
pub struct ListDecodeError {
    pub message: String,
}

pub fn encode(items: &[String]) -> String {
    Value::Array(items.iter().cloned().map(Value::String).collect()).to_string()
}

/// Decodes a value submitted by a client. Anything but a JSON array of
/// strings is an error.
pub fn decode_strict(raw: &str) -> Result<Vec<String>, ListDecodeError> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|err| ListDecodeError {
        message: err.to_string(),
    })
}

/// Decodes a stored value. Never fails.
pub fn decode_lenient(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(value) => value,
                other => other.to_string(),
            })
            .collect(),
        Ok(Value::String(value)) => vec![value],
        _ if raw.trim().is_empty() => Vec::new(),
        _ => vec![raw.to_string()],
    }
}

/// Trims every item, drops empty ones and, when `dedupe` is set, keeps only
/// the first occurrence of each item.
pub fn tidy(items: Vec<String>, dedupe: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if dedupe && out.iter().any(|existing| existing == item) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_json_array() {
        let encoded = encode(&["rust".to_string(), "go".to_string()]);
        assert_eq!(encoded, r#"["rust","go"]"#);
        assert_eq!(decode_strict(&encoded).unwrap(), vec!["rust", "go"]);
    }

    #[test]
    fn test_strict_rejects_non_arrays() {
        assert!(decode_strict("rust").is_err());
        assert!(decode_strict(r#""rust""#).is_err());
        let err = decode_strict("[1, 2]").unwrap_err();
        assert!(err.to_string().starts_with("expected a JSON array of strings: "));
    }

    #[test]
    fn test_lenient_falls_back_to_single_item() {
        assert_eq!(decode_lenient(r#"["a","b"]"#), vec!["a", "b"]);
        assert_eq!(decode_lenient(r#""cloud""#), vec!["cloud"]);
        assert_eq!(decode_lenient("cloud native"), vec!["cloud native"]);
        assert!(decode_lenient("").is_empty());
    }

    #[test]
    fn test_tidy_trims_and_dedupes() {
        let items = vec![
            " rust ".to_string(),
            String::new(),
            "rust".to_string(),
            "go".to_string(),
        ];
        assert_eq!(tidy(items.clone(), true), vec!["rust", "go"]);
        assert_eq!(tidy(items, false), vec!["rust", "rust", "go"]);
    }
}
