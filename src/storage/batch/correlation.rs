//! Correlation id extraction from encoded payloads.

use serde_json::{Map, Value};

/// Outcome of inspecting one payload before it is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// First non-empty string found under the candidate keys; empty otherwise.
    pub id: String,
    /// Whether the payload parsed as a JSON object.
    pub structured: bool,
}

/// Scans `keys` in priority order and returns the first non-empty string value.
///
/// Non-string values are skipped, not stringified.
pub fn extract_correlation_id<'a>(object: &'a Map<String, Value>, keys: &[String]) -> Option<&'a str> {
    keys.iter().find_map(|key| match object.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    })
}

/// Parses `raw` and extracts its correlation id.
///
/// Anything that is not a JSON object yields an empty id and
/// `structured == false`; the caller still loads the raw bytes.
pub fn correlate(raw: &[u8], keys: &[String]) -> Correlation {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(object)) => Correlation {
            id: extract_correlation_id(&object, keys)
                .unwrap_or_default()
                .to_string(),
            structured: true,
        },
        _ => Correlation {
            id: String::new(),
            structured: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        vec!["request_id".to_string(), "req_id".to_string()]
    }

    #[test]
    fn test_second_key_used_when_first_missing() {
        let c = correlate(br#"{"req_id":"abc"}"#, &keys());
        assert_eq!(c.id, "abc");
        assert!(c.structured);
    }

    #[test]
    fn test_first_non_empty_match_wins() {
        let c = correlate(br#"{"request_id":"","req_id":"xyz"}"#, &keys());
        assert_eq!(c.id, "xyz");
    }

    #[test]
    fn test_key_priority_beats_payload_order() {
        let c = correlate(br#"{"req_id":"second","request_id":"first"}"#, &keys());
        assert_eq!(c.id, "first");
    }

    #[test]
    fn test_non_string_values_are_ignored() {
        let c = correlate(br#"{"request_id":42,"req_id":"text"}"#, &keys());
        assert_eq!(c.id, "text");
        let c = correlate(br#"{"request_id":null}"#, &keys());
        assert_eq!(c.id, "");
        assert!(c.structured);
    }

    #[test]
    fn test_unparseable_payload_has_empty_id() {
        let c = correlate(b"not json at all", &keys());
        assert_eq!(c, Correlation { id: String::new(), structured: false });
    }

    #[test]
    fn test_json_that_is_not_an_object_is_unstructured() {
        let c = correlate(br#"["request_id","abc"]"#, &keys());
        assert!(!c.structured);
        assert!(c.id.is_empty());
    }
}
