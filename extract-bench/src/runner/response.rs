//! Turning model responses into records

use extract_judge::{Record, Value};
use regex::Regex;
use std::sync::OnceLock;

/// Why a response could not be turned into a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("response is empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response JSON is {0}, expected an object")]
    NotAnObject(&'static str),
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Parse a completion into a record.
///
/// Accepts a bare JSON object, an object inside a fenced code block, or the
/// outermost `{...}` span of surrounding prose, in that order.
pub fn parse_record(content: &str) -> Result<Record, ParseError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let direct = serde_json::from_str::<serde_json::Value>(trimmed);
    let json = match direct {
        Ok(json) => json,
        Err(first_error) => {
            let fenced: Option<serde_json::Value> = fence_pattern()
                .and_then(|re| re.captures(trimmed))
                .and_then(|caps| caps.get(1))
                .and_then(|m| serde_json::from_str(m.as_str()).ok());
            let embedded = || -> Option<serde_json::Value> {
                let start = trimmed.find('{')?;
                let end = trimmed.rfind('}')?;
                (start < end)
                    .then(|| serde_json::from_str(&trimmed[start..=end]).ok())
                    .flatten()
            };
            fenced
                .or_else(embedded)
                .ok_or_else(|| ParseError::InvalidJson(first_error.to_string()))?
        }
    };

    match Value::from(json) {
        Value::Object(record) => Ok(record),
        other => Err(ParseError::NotAnObject(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let record = parse_record(r#"{"Company": ["ACME"], "Date": null}"#).unwrap();
        assert_eq!(record.len(), 2);
        assert!(record["Date"].is_null());
    }

    #[test]
    fn test_fenced_block() {
        let content = "Here you go:\n```json\n{\"num_rows\": 4}\n```\nAnything else?";
        let record = parse_record(content).unwrap();
        assert_eq!(record["num_rows"], Value::Int(4));
    }

    #[test]
    fn test_embedded_object() {
        let content = "Result: {\"EMAIL\": \"a@b.co\"} done";
        let record = parse_record(content).unwrap();
        assert_eq!(record["EMAIL"], Value::from("a@b.co"));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert_eq!(parse_record("[1, 2]"), Err(ParseError::NotAnObject("array")));
        assert_eq!(parse_record("   "), Err(ParseError::Empty));
        assert!(matches!(parse_record("no json here"), Err(ParseError::InvalidJson(_))));
    }
}
