//! Response body decoding.
//!
//! Backends and intermediaries sometimes answer with HTML error pages or
//! plain text. Decoding never fails: empty bodies become `null`, JSON is
//! parsed, and anything else is wrapped as `{"raw": text}`.

use serde_json::{json, Value};

pub fn decode_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Message for a failed response: `error`, then `message`, then a fallback.
pub fn error_message(data: &Value) -> String {
    ["error", "message"]
        .iter()
        .filter_map(|key| data.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("Request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_null() {
        assert_eq!(decode_body(""), Value::Null);
    }

    #[test]
    fn json_body_is_parsed() {
        assert_eq!(decode_body(r#"{"ledger":[]}"#), json!({"ledger": []}));
        assert_eq!(decode_body("3"), json!(3));
    }

    #[test]
    fn non_json_body_is_wrapped() {
        let html = "<html><body>502 Bad Gateway</body></html>";
        assert_eq!(decode_body(html), json!({ "raw": html }));
        assert_eq!(decode_body("   "), json!({ "raw": "   " }));
        assert_eq!(decode_body("{truncated"), json!({ "raw": "{truncated" }));
    }

    #[test]
    fn error_message_prefers_error_then_message() {
        assert_eq!(error_message(&json!({"error": "invalid credentials"})), "invalid credentials");
        assert_eq!(error_message(&json!({"message": "gone"})), "gone");
        assert_eq!(error_message(&json!({"error": "", "message": "m"})), "m");
        assert_eq!(error_message(&json!({"raw": "<html>"})), "Request failed");
        assert_eq!(error_message(&Value::Null), "Request failed");
    }
}
