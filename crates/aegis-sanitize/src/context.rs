//! Context-tree sanitization.
//!
//! Telemetry context arrives as an arbitrary `serde_json::Value` built by
//! whatever component caught the error. The traversal here is bounded in
//! depth and width, so a pathological tree can neither loop nor overflow
//! the stack; subtrees past the bound are replaced with a marker instead of
//! being walked. Keys naming credentials are redacted outright, and the
//! credential words themselves are scrubbed from every string so the
//! serialized context cannot contain them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::scrub::sanitize_string;

/// Maximum nesting depth walked before a subtree is replaced by
/// [`DEPTH_MARKER`].
pub const MAX_CONTEXT_DEPTH: usize = 8;
/// Maximum entries kept per object or array.
pub const MAX_CONTEXT_ENTRIES: usize = 64;
/// Length ceiling for each string inside the context tree.
pub const MAX_CONTEXT_STRING_LEN: usize = 256;
/// Placeholder for subtrees beyond the depth bound.
pub const DEPTH_MARKER: &str = "[MAX_DEPTH]";
/// Placeholder for redacted credential words and values.
pub const REDACTED: &str = "[REDACTED]";

// No word boundaries: "auth_token" and "apiSecret" must not survive either.
static RE_SENSITIVE_WORD: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(password|token|secret|api_key)").ok());

const SENSITIVE_KEY_WORDS: [&str; 4] = ["password", "token", "secret", "api_key"];

/// Whether a key names a credential and must have its value redacted.
pub fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_KEY_WORDS.iter().any(|w| lowered.contains(w))
}

/// Sanitize one string destined for the context tree.
fn sanitize_context_string(input: &str) -> String {
    let mut out = sanitize_string(input, MAX_CONTEXT_STRING_LEN);
    if let Some(re) = RE_SENSITIVE_WORD.as_ref() {
        out = re.replace_all(&out, REDACTED).into_owned();
    }
    if out.chars().count() > MAX_CONTEXT_STRING_LEN {
        out = out.chars().take(MAX_CONTEXT_STRING_LEN).collect();
    }
    out
}

/// Sanitize a whole context tree.
///
/// Strings are scrubbed, credential-named keys have their values replaced
/// with [`REDACTED`], containers are capped at [`MAX_CONTEXT_ENTRIES`], and
/// anything nested deeper than [`MAX_CONTEXT_DEPTH`] becomes
/// [`DEPTH_MARKER`]. Numbers, booleans, and nulls pass through unchanged.
pub fn sanitize_context(value: &Value) -> Value {
    sanitize_value(value, 0)
}

fn sanitize_value(value: &Value, depth: usize) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_context_string(s)),
        Value::Object(_) | Value::Array(_) if depth >= MAX_CONTEXT_DEPTH => {
            Value::String(DEPTH_MARKER.to_string())
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, val) in map.iter().take(MAX_CONTEXT_ENTRIES) {
                let clean_key = sanitize_context_string(key);
                if is_sensitive_key(key) {
                    out.insert(clean_key, Value::String(REDACTED.to_string()));
                } else {
                    out.insert(clean_key, sanitize_value(val, depth + 1));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(MAX_CONTEXT_ENTRIES)
                .map(|v| sanitize_value(v, depth + 1))
                .collect(),
        ),
        other => other.clone(),
    }
}
