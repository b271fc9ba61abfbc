//! Credential redaction for structured log fields.

use serde_json::{Map, Value};

const REDACTED: &str = "[REDACTED]";

const DENYLIST_KEYS: [&str; 9] = [
    "token",
    "access_token",
    "refresh_token",
    "authorization",
    "api_key",
    "apikey",
    "password",
    "pin",
    "secret",
];

/// Returns true when a field name names a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

/// Replace credential-looking content in a field value.
pub fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_credential(s) => Value::String(REDACTED.to_string()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), sanitize_value(k, v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(key, item))
                .collect::<Vec<_>>(),
        ),
        _ => value.clone(),
    }
}

fn looks_like_credential(raw: &str) -> bool {
    if raw.to_ascii_lowercase().starts_with("bearer ") {
        return true;
    }
    // JWT: header.payload.signature
    raw.matches('.').count() == 2
        && raw.len() > 40
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_keys_are_redacted() {
        let value = Value::String("abc".to_string());
        assert_eq!(
            sanitize_value("access_token", &value),
            Value::String(REDACTED.to_string())
        );
        assert_eq!(
            sanitize_value("newPin", &value),
            Value::String(REDACTED.to_string())
        );
        assert_eq!(sanitize_value("table", &value), value);
    }

    #[test]
    fn bearer_values_are_redacted_under_any_key() {
        let value = Value::String("Bearer eyJhbGciOi".to_string());
        assert_eq!(
            sanitize_value("header", &value),
            Value::String(REDACTED.to_string())
        );
    }

    #[test]
    fn nested_objects_are_walked() {
        let value = serde_json::json!({ "user": { "id": "u1", "refresh_token": "r" } });
        let sanitized = sanitize_value("payload", &value);
        assert_eq!(sanitized["user"]["id"], "u1");
        assert_eq!(sanitized["user"]["refresh_token"], REDACTED);
    }

    #[test]
    fn plain_urls_are_kept() {
        let value = Value::String("https://db.example.com/scripts?select=id".to_string());
        assert_eq!(sanitize_value("url", &value), value);
    }
}
