//! Telemetry record types.
//!
//! These are the payloads that cross the process boundary: the error report
//! POSTed to the collection endpoint and the queue entries persisted across
//! reloads. Field names are camelCase on the wire; the collection endpoint
//! predates this layer and its contract is fixed.

use serde::{Deserialize, Serialize};

use crate::{FallbackLevel, Timestamp};

/// Name, message, and optional stack of a caught error.
///
/// All three strings are expected to be sanitized before an `ErrorDetails`
/// is placed into a record; construction itself does not sanitize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stack: Option<String>,
}

impl ErrorDetails {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Snapshot of what the host device can render.
///
/// Computed once per probe lifetime and cached; never mutated in place.
/// A re-probe replaces the snapshot wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub webxr_supported: bool,
    pub webgl_supported: bool,
    pub detected_at: Timestamp,
}

impl Capabilities {
    /// Snapshot for a host with no rendering capability at all.
    pub fn none(detected_at: Timestamp) -> Self {
        Self {
            webxr_supported: false,
            webgl_supported: false,
            detected_at,
        }
    }

    /// The richest fallback tier this device can attempt.
    pub fn best_level(&self) -> FallbackLevel {
        if self.webxr_supported {
            FallbackLevel::Immersive
        } else if self.webgl_supported {
            FallbackLevel::Rendered3d
        } else {
            FallbackLevel::Flat2d
        }
    }
}

/// A sanitized, capability-annotated description of a caught error.
///
/// Immutable once constructed. `context` has already been through the
/// bounded sanitizing traversal; `timestamp` is ISO-8601 in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error: ErrorDetails,
    pub context: serde_json::Value,
    pub timestamp: String,
    pub user_agent: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub capabilities: Option<Capabilities>,
}

impl ErrorRecord {
    /// The `component` field of the sanitized context, when present.
    pub fn component(&self) -> Option<&str> {
        self.context.get("component").and_then(|v| v.as_str())
    }
}

/// One pending record in the delivery queue.
///
/// `attempts` counts failed delivery attempts; `last_attempt_at` drives the
/// replay backoff window. Older persisted payloads without the field
/// deserialize with no recorded attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub record: ErrorRecord,
    pub enqueued_at: Timestamp,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_attempt_at: Option<Timestamp>,
}

impl QueueEntry {
    pub fn new(record: ErrorRecord, enqueued_at: Timestamp) -> Self {
        Self {
            record,
            enqueued_at,
            attempts: 0,
            last_attempt_at: None,
        }
    }

    /// Record a failed delivery attempt.
    pub fn note_attempt(&mut self, at: Timestamp) {
        self.attempts += 1;
        self.last_attempt_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message: &str) -> ErrorRecord {
        ErrorRecord {
            error: ErrorDetails::new("Error", message),
            context: serde_json::json!({"component": "scene"}),
            timestamp: Timestamp::from_secs(1).to_iso8601(),
            user_agent: "test-agent".into(),
            url: "https://example.test/xr".into(),
            capabilities: Some(Capabilities::none(Timestamp::from_secs(1))),
        }
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(record("boom")).unwrap();
        assert!(json.get("userAgent").is_some());
        assert!(json.get("capabilities").unwrap().get("webxrSupported").is_some());
        assert!(json.get("user_agent").is_none());

        let entry = QueueEntry::new(record("boom"), Timestamp::from_secs(2));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("enqueuedAt").is_some());
        assert!(json.get("lastAttemptAt").is_none());
    }

    #[test]
    fn test_stack_omitted_when_absent() {
        let details = ErrorDetails::new("TypeError", "boom");
        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("stack").is_none());

        let with_stack = details.with_stack("at render (scene)");
        let json = serde_json::to_value(&with_stack).unwrap();
        assert_eq!(json.get("stack").unwrap(), "at render (scene)");
    }

    #[test]
    fn test_best_level_mapping() {
        let at = Timestamp::from_secs(1);
        let both = Capabilities {
            webxr_supported: true,
            webgl_supported: true,
            detected_at: at,
        };
        assert_eq!(both.best_level(), FallbackLevel::Immersive);

        let gl_only = Capabilities {
            webxr_supported: false,
            webgl_supported: true,
            detected_at: at,
        };
        assert_eq!(gl_only.best_level(), FallbackLevel::Rendered3d);

        assert_eq!(Capabilities::none(at).best_level(), FallbackLevel::Flat2d);
    }

    #[test]
    fn test_entry_attempt_tracking() {
        let mut entry = QueueEntry::new(record("boom"), Timestamp::from_secs(2));
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.last_attempt_at, None);

        entry.note_attempt(Timestamp::from_secs(3));
        entry.note_attempt(Timestamp::from_secs(4));
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_attempt_at, Some(Timestamp::from_secs(4)));
    }

    #[test]
    fn test_component_lookup() {
        let r = record("boom");
        assert_eq!(r.component(), Some("scene"));

        let mut bare = record("boom");
        bare.context = serde_json::json!({});
        assert_eq!(bare.component(), None);
    }

    #[test]
    fn test_entry_round_trip_without_last_attempt() {
        // Payloads persisted before attempt tracking carry no lastAttemptAt.
        let json = serde_json::json!({
            "record": serde_json::to_value(record("old")).unwrap(),
            "enqueuedAt": 2000,
            "attempts": 1,
        });
        let entry: QueueEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.last_attempt_at, None);
    }
}
