//! The audit log facade.

use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use uuid::Uuid;
use vigil_core::{ConsentLedgerEntry, ConsentState, EventLogEntry, redact_value};
use vigil_error::VigilResult;
use vigil_interface::{EventStore, LedgerStore};

/// Single write path for the consent ledger and the event log.
///
/// Ledger appends are strict: the caller must not consider its transition
/// complete until `append_ledger` returns `Ok`. Event appends are
/// best-effort observability and never escalate.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vigil_audit::{AuditLog, MemoryEventStore, MemoryLedgerStore};
///
/// let audit = AuditLog::new(
///     Arc::new(MemoryLedgerStore::new()),
///     Arc::new(MemoryEventStore::new()),
/// );
/// # let _ = audit;
/// ```
#[derive(Clone)]
pub struct AuditLog {
    ledger: Arc<dyn LedgerStore>,
    events: Arc<dyn EventStore>,
}

impl AuditLog {
    /// Create an audit log over the given stores.
    pub fn new(ledger: Arc<dyn LedgerStore>, events: Arc<dyn EventStore>) -> Self {
        Self { ledger, events }
    }

    /// Durably append a consent ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the append fails; the caller must abort
    /// the transition the entry describes.
    #[tracing::instrument(skip(self, entry), fields(active = entry.active))]
    pub async fn append_ledger(&self, entry: &ConsentLedgerEntry) -> VigilResult<()> {
        self.ledger.append(entry).await
    }

    /// Fold the full ordered ledger into the current consent state.
    ///
    /// An empty ledger yields the disarmed state.
    pub async fn replay_state(&self) -> VigilResult<ConsentState> {
        let entries = self.ledger.read_all().await?;
        Ok(ConsentState::replay(&entries))
    }

    /// Read the full ordered ledger.
    pub async fn read_ledger(&self) -> VigilResult<Vec<ConsentLedgerEntry>> {
        self.ledger.read_all().await
    }

    /// Number of ledger entries appended so far.
    pub async fn ledger_len(&self) -> VigilResult<usize> {
        self.ledger.len().await
    }

    /// Record an event with a fresh correlation id.
    ///
    /// The payload is redacted before append. Failures are logged and
    /// swallowed: losing an observability record must never fail the
    /// operation that produced it.
    pub async fn record_event(&self, source: &str, kind: &str, payload: JsonValue) {
        self.record_correlated(source, kind, payload, Uuid::new_v4())
            .await;
    }

    /// Record an event under an existing correlation id.
    #[tracing::instrument(skip(self, payload), fields(source, kind))]
    pub async fn record_correlated(
        &self,
        source: &str,
        kind: &str,
        payload: JsonValue,
        correlation_id: Uuid,
    ) {
        let entry =
            EventLogEntry::new(source, kind, redact_value(&payload)).with_correlation(correlation_id);
        if let Err(e) = self.events.append(&entry).await {
            tracing::warn!(error = %e, source, kind, "Failed to append event record");
        }
    }

    /// Record an outbound API request.
    pub async fn record_api_request(
        &self,
        source: &str,
        method: &str,
        url: &str,
        status_code: Option<u16>,
    ) {
        self.record_event(
            source,
            "api_request",
            json!({
                "method": method,
                "url": url,
                "status_code": status_code,
            }),
        )
        .await;
    }

    /// Record an API response, keeping metadata only.
    ///
    /// Full response bodies never reach the log; only the status and the
    /// first few top-level keys are kept.
    pub async fn record_api_response(
        &self,
        source: &str,
        status_code: u16,
        response: Option<&JsonValue>,
    ) {
        let mut payload = json!({ "status_code": status_code });
        if let Some(JsonValue::Object(map)) = response {
            payload["has_data"] = json!(true);
            payload["keys"] = json!(map.keys().take(10).collect::<Vec<_>>());
        }
        self.record_event(source, "api_response", payload).await;
    }

    /// Record a message sent through a control channel.
    pub async fn record_message_sent(&self, channel: &str, recipient: &str, preview: Option<&str>) {
        let mut payload = json!({
            "channel": channel,
            "recipient": recipient,
        });
        if let Some(preview) = preview {
            let truncated: String = preview.chars().take(100).collect();
            payload["message_preview"] = json!(truncated);
        }
        self.record_event(channel, "message_sent", payload).await;
    }

    /// Record an error with optional context fields.
    pub async fn record_error(&self, source: &str, error: &str, context: Option<JsonValue>) {
        let mut payload = json!({ "error": error });
        if let Some(JsonValue::Object(extra)) = context
            && let Some(map) = payload.as_object_mut()
        {
            map.extend(extra);
        }
        self.record_event(source, "error", payload).await;
    }

    /// Read the full ordered event log.
    pub async fn read_events(&self) -> VigilResult<Vec<EventLogEntry>> {
        self.events.read_all().await
    }
}
