//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences. The whole
//! text is tried first, then the slice from the first `{` to the last `}`.

use serde_json::Value;

use crate::error::{Error, Result};

/// Longest raw reply quoted in an error message
const MAX_RAW_IN_ERROR: usize = 300;

/// Parse a model reply into a JSON value
pub fn parse_json_reply(response: &str) -> Result<Value> {
    let response = response.trim();

    if let Ok(value) = serde_json::from_str::<Value>(response) {
        return Ok(value);
    }

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid JSON from AI: {} | Raw: {}",
                    e,
                    truncate_raw(json_str)
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate_raw(response)
        ))),
    }
}

fn truncate_raw(raw: &str) -> String {
    match raw.char_indices().nth(MAX_RAW_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_json_reply(r#"{"category":"Meals","confidence":0.9,"reason":"x"}"#).unwrap();
        assert_eq!(value["category"], "Meals");
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let value = parse_json_reply(
            "Sure! Here is the answer:\n```json\n{\"category\": \"Travel\", \"confidence\": 0.7, \"reason\": \"cab\"}\n```\nHope that helps.",
        )
        .unwrap();
        assert_eq!(value, json!({"category": "Travel", "confidence": 0.7, "reason": "cab"}));
    }

    #[test]
    fn test_non_object_json_passes_through() {
        // Shape checks happen later; parsing only cares about valid JSON
        assert_eq!(parse_json_reply("[1, 2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_no_json() {
        let err = parse_json_reply("I cannot classify this").unwrap_err();
        assert!(err.to_string().contains("No JSON found"));
        assert!(parse_json_reply("} backwards {").is_err());
        assert!(parse_json_reply("{not json}").is_err());
    }

    #[test]
    fn test_long_raw_is_truncated_on_char_boundary() {
        let raw = format!("{{{}", "₹".repeat(1000));
        let err = parse_json_reply(&raw).unwrap_err().to_string();
        assert!(err.ends_with("..."));
        assert!(err.chars().count() < 400);
    }
}
