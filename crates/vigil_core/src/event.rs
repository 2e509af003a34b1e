//! Event log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One append-only event record.
///
/// Written for every external interaction (API call, message sent, device
/// event, error) and for internal transitions worth auditing. Independent of
/// the consent ledger: events are observability, the ledger is authority.
///
/// # Examples
///
/// ```
/// use vigil_core::EventLogEntry;
/// use serde_json::json;
///
/// let event = EventLogEntry::new("discord", "message_sent", json!({"channel": "ops"}));
/// assert_eq!(event.source, "discord");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Event timestamp
    pub ts: DateTime<Utc>,
    /// Originating component or adapter (e.g. "consent", "scheduler", "discord")
    pub source: String,
    /// Event type (e.g. "armed", "task_canceled", "api_request")
    pub kind: String,
    /// Structured payload; redacted before persistence
    pub payload: JsonValue,
    /// Correlates related events across components
    pub correlation_id: Uuid,
}

impl EventLogEntry {
    /// Create an event timestamped now with a fresh correlation id.
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        Self {
            ts: Utc::now(),
            source: source.into(),
            kind: kind.into(),
            payload,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Reuse an existing correlation id so related events group together.
    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
