//! Inbound command routing.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use vigil_audit::AuditLog;
use vigil_consent::ConsentAuthority;
use vigil_core::{CommandIntent, ConsentLedgerEntry, IntentKind};
use vigil_error::VigilResult;

/// Normalizes inbound control-channel text into authorization intents.
///
/// Matching is case-insensitive exact-phrase against `ARM`, `DISARM`, and
/// `SAFE MODE`. Anything else becomes [`IntentKind::Unknown`], is recorded
/// to the event log, and is never forwarded to the authority.
/// Confirmation and error replies are the caller's concern.
pub struct CommandRouter {
    authority: Arc<ConsentAuthority>,
    audit: AuditLog,
}

impl CommandRouter {
    /// Create a router forwarding to `authority`.
    pub fn new(authority: Arc<ConsentAuthority>, audit: AuditLog) -> Self {
        Self { authority, audit }
    }

    /// Map raw text to an intent kind.
    pub fn parse(text: &str) -> IntentKind {
        match text.trim().to_uppercase().as_str() {
            "ARM" => IntentKind::Arm,
            "DISARM" => IntentKind::Disarm,
            "SAFE MODE" => IntentKind::SafeMode,
            _ => IntentKind::Unknown,
        }
    }

    /// Route one inbound message.
    ///
    /// Returns the ledger entry for a known command, or `None` when the
    /// text did not parse (unknown commands are logged, not fatal).
    ///
    /// # Errors
    ///
    /// Propagates the authority's errors for known commands (e.g. a ledger
    /// append failure aborting the transition).
    #[tracing::instrument(skip(self, text))]
    pub async fn route(
        &self,
        channel_id: &str,
        text: &str,
        ts: DateTime<Utc>,
    ) -> VigilResult<Option<ConsentLedgerEntry>> {
        let kind = Self::parse(text);
        let intent = CommandIntent::new(kind, channel_id, text, ts);

        if kind == IntentKind::Unknown {
            tracing::debug!(channel = channel_id, "Unrecognized command text");
            self.audit
                .record_event(
                    "router",
                    "unknown_command",
                    json!({
                        "channel": channel_id,
                        "raw_text": intent.raw_text,
                    }),
                )
                .await;
            return Ok(None);
        }

        tracing::info!(channel = channel_id, intent = %kind, "Routing command intent");
        self.audit
            .record_event(
                "router",
                "command_received",
                json!({
                    "channel": channel_id,
                    "intent": kind.to_string(),
                }),
            )
            .await;

        let entry = self.authority.apply(intent).await?;
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_audit::{MemoryEventStore, MemoryLedgerStore};
    use vigil_core::DEVICE_TOPIC;
    use vigil_interface::ConsentGate;

    fn router() -> (CommandRouter, Arc<ConsentAuthority>, AuditLog) {
        let audit = AuditLog::new(
            Arc::new(MemoryLedgerStore::new()),
            Arc::new(MemoryEventStore::new()),
        );
        let authority = ConsentAuthority::new(audit.clone());
        (
            CommandRouter::new(authority.clone(), audit.clone()),
            authority,
            audit,
        )
    }

    #[test]
    fn parse_is_case_insensitive_exact_phrase() {
        assert_eq!(CommandRouter::parse("ARM"), IntentKind::Arm);
        assert_eq!(CommandRouter::parse("arm"), IntentKind::Arm);
        assert_eq!(CommandRouter::parse("  Disarm "), IntentKind::Disarm);
        assert_eq!(CommandRouter::parse("safe mode"), IntentKind::SafeMode);
        assert_eq!(CommandRouter::parse("SAFE  MODE"), IntentKind::Unknown);
        assert_eq!(CommandRouter::parse("arm now"), IntentKind::Unknown);
        assert_eq!(CommandRouter::parse("please disarm"), IntentKind::Unknown);
        assert_eq!(CommandRouter::parse(""), IntentKind::Unknown);
    }

    #[tokio::test]
    async fn known_command_reaches_the_authority() {
        let (router, authority, _audit) = router();

        let entry = router
            .route("discord", "arm", Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(entry.active);
        assert!(authority.is_action_allowed(DEVICE_TOPIC).await);

        router.route("discord", "DISARM", Utc::now()).await.unwrap();
        assert!(!authority.is_action_allowed(DEVICE_TOPIC).await);
    }

    #[tokio::test]
    async fn unknown_text_is_logged_not_forwarded() {
        let (router, _authority, audit) = router();

        let result = router
            .route("discord", "do the thing", Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());

        // No ledger entry was appended; only an event record exists.
        assert_eq!(audit.ledger_len().await.unwrap(), 0);
        let events = audit.read_events().await.unwrap();
        assert!(events.iter().any(|event| event.kind == "unknown_command"));
    }
}
