//! Redaction of tool results before they leave the process.
//!
//! Drops any key whose name looks like it could carry a credential.

use serde_json::{Map, Value};

/// Substrings that mark a key as sensitive (matched case-insensitively).
pub const SENSITIVE_KEY_PARTS: [&str; 6] =
    ["cookie", "token", "auth", "credential", "password", "secret"];

/// Whether a result key must be stripped.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| lower.contains(part))
}

/// Drop every sensitive key from a result map.
pub fn sanitize_result(result: Map<String, Value>) -> Map<String, Value> {
    result
        .into_iter()
        .filter(|(key, _)| !is_sensitive_key(key))
        .collect()
}
