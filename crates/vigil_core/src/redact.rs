//! Secret redaction for audit payloads.
//!
//! Token-shaped fields must never reach storage in plaintext. Payloads pass
//! through [`redact_value`] before any event append.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

const MASK: &str = "***REDACTED***";

/// Key patterns whose following value gets masked.
const SECRET_KEYS: [&str; 5] = ["token", "password", "secret", "api[_-]?key", "authorization"];

fn patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SECRET_KEYS
            .iter()
            .map(|key| {
                // Capture the key and separator, mask whatever value follows.
                let pattern = format!(r#"(?i)({key}["\s:=]+)([^\s"'),]+)"#);
                Regex::new(&pattern).expect("secret pattern compiles")
            })
            .collect()
    })
}

/// Mask secret-shaped values in free text.
///
/// # Examples
///
/// ```
/// use vigil_core::redact_secrets;
///
/// let text = redact_secrets("api_key=abc123 status=ok");
/// assert!(!text.contains("abc123"));
/// assert!(text.contains("***REDACTED***"));
/// ```
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in patterns() {
        result = pattern
            .replace_all(&result, format!("${{1}}{MASK}"))
            .into_owned();
    }
    result
}

/// Mask secret-shaped values inside a JSON payload.
///
/// Works on the serialized form so nested objects and embedded
/// key=value strings are both covered. If masking breaks the JSON
/// structure, the whole redacted text is stored as a string rather than
/// risking the original leaking through.
pub fn redact_value(payload: &JsonValue) -> JsonValue {
    let serialized = payload.to_string();
    let redacted = redact_secrets(&serialized);
    serde_json::from_str(&redacted).unwrap_or(JsonValue::String(redacted))
}
