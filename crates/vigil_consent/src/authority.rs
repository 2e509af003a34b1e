//! The consent authority.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use vigil_audit::AuditLog;
use vigil_core::{
    ArmCommand, CommandIntent, ConsentLedgerEntry, ConsentState, DEVICE_TOPIC, IntentKind,
};
use vigil_error::{
    UnknownCommandError, ValidationError, ValidationErrorKind, VigilResult,
};
use vigil_interface::{ConsentGate, PendingTaskCanceler};

/// Outcome of a safe-mode transition.
#[derive(Debug, Clone)]
pub struct SafeModeReport {
    /// The disarm entry appended to the ledger
    pub entry: ConsentLedgerEntry,
    /// How many pending tasks were canceled
    pub canceled_tasks: usize,
}

/// The authorization state machine gating device-affecting actions.
///
/// All mutations serialize through a single lock held across the
/// state-change + ledger-append pair. A `PersistenceError` from the append
/// aborts the transition: in-memory state is only committed after the entry
/// is durable, so memory never diverges from the ledger.
///
/// The scheduler is attached late through [`PendingTaskCanceler`] so
/// `safe_mode` can revoke pending work without a crate cycle. With no
/// canceler attached, safe mode still disarms.
pub struct ConsentAuthority {
    state: Mutex<ConsentState>,
    audit: AuditLog,
    canceler: RwLock<Option<Arc<dyn PendingTaskCanceler>>>,
}

impl ConsentAuthority {
    /// Create an authority starting from the disarmed state.
    pub fn new(audit: AuditLog) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ConsentState::disarmed()),
            audit,
            canceler: RwLock::new(None),
        })
    }

    /// Create an authority by replaying the persisted ledger.
    ///
    /// Consent that expired during downtime is eagerly disarmed (with a
    /// ledger entry) before the authority is handed out, so a restart can
    /// only converge toward "disabled."
    #[tracing::instrument(skip(audit))]
    pub async fn recover(audit: AuditLog) -> VigilResult<Arc<Self>> {
        let recovered = audit.replay_state().await?;
        tracing::info!(active = recovered.active, "Recovered consent state from ledger");

        let authority = Arc::new(Self {
            state: Mutex::new(recovered),
            audit,
            canceler: RwLock::new(None),
        });
        authority.check_expiry().await?;
        Ok(authority)
    }

    /// Attach the scheduler's cancel-all hook.
    pub fn attach_canceler(&self, canceler: Arc<dyn PendingTaskCanceler>) {
        *self.canceler.write() = Some(canceler);
    }

    /// Snapshot the current consent state.
    pub async fn state(&self) -> ConsentState {
        self.state.lock().await.clone()
    }

    /// Grant consent for an armed window.
    ///
    /// Sets `active` and `armed_until = now + duration` (ten minutes when
    /// unspecified). Topic sets are preserved unless the command replaces
    /// them; a resulting empty allowed set defaults to `{"device"}`.
    ///
    /// # Errors
    ///
    /// `ValidationError` if the duration is not strictly positive;
    /// `PersistenceError` if the ledger append fails (the transition is
    /// aborted).
    #[tracing::instrument(skip(self, cmd))]
    pub async fn arm(&self, cmd: ArmCommand) -> VigilResult<ConsentLedgerEntry> {
        let duration = cmd.effective_duration();
        if duration <= chrono::Duration::zero() {
            return Err(ValidationError::new(ValidationErrorKind::NonPositiveDuration(
                duration.num_seconds(),
            )))?;
        }

        let mut state = self.state.lock().await;
        let now = Utc::now();

        let mut next = state.clone();
        next.active = true;
        next.armed_until = Some(now + duration);
        if let Some(allowed) = cmd.allowed_modes {
            next.allowed_modes = allowed;
        }
        if let Some(revoked) = cmd.revoked_topics {
            next.revoked_topics = revoked;
        }
        if next.allowed_modes.is_empty() {
            next.allowed_modes.insert(DEVICE_TOPIC.to_string());
        }

        let entry = next.to_entry(now);
        self.audit.append_ledger(&entry).await?;
        *state = next;
        drop(state);

        tracing::info!(armed_until = ?entry.armed_until, "Consent armed");
        self.audit
            .record_event(
                "consent",
                "armed",
                json!({
                    "armed_until": entry.armed_until,
                    "allowed_modes": entry.allowed_modes,
                }),
            )
            .await;
        Ok(entry)
    }

    /// Revoke consent.
    ///
    /// Idempotent: disarming an already-disarmed state still appends a
    /// ledger entry: the ledger records intent, not just net effect.
    #[tracing::instrument(skip(self))]
    pub async fn disarm(&self) -> VigilResult<ConsentLedgerEntry> {
        let mut state = self.state.lock().await;
        let entry = Self::disarm_locked(&self.audit, &mut state).await?;
        drop(state);

        self.audit.record_event("consent", "disarmed", json!({})).await;
        Ok(entry)
    }

    /// Revoke consent and cancel every pending scheduled task.
    ///
    /// The strongest guarantee in the system: the disarm entry is durable
    /// and all pending work is canceled before this returns, with the state
    /// lock held throughout so no other transition interleaves. Tasks
    /// already past their pre-fire re-validation are not retroactively
    /// canceled, but any gated action they run re-validates against the
    /// already-disarmed state.
    #[tracing::instrument(skip(self))]
    pub async fn safe_mode(&self) -> VigilResult<SafeModeReport> {
        let mut state = self.state.lock().await;
        let entry = Self::disarm_locked(&self.audit, &mut state).await?;

        let canceler = self.canceler.read().clone();
        let canceled_tasks = match canceler {
            Some(canceler) => canceler.cancel_all().await,
            None => {
                tracing::warn!("Safe mode with no scheduler attached; nothing to cancel");
                0
            }
        };
        drop(state);

        tracing::info!(canceled_tasks, "SAFE MODE engaged");
        self.audit
            .record_event(
                "consent",
                "safe_mode",
                json!({
                    "message": "SAFE MODE activated - all consent disabled",
                    "canceled_tasks": canceled_tasks,
                }),
            )
            .await;
        Ok(SafeModeReport {
            entry,
            canceled_tasks,
        })
    }

    /// Self-check for a passed armed window.
    ///
    /// Invoked by the expiry watcher on a fixed interval. If consent is
    /// active but the window has passed, performs an implicit disarm with
    /// its own ledger entry, so state converges to disarmed even with no
    /// pending permission checks. Returns whether a disarm occurred.
    #[tracing::instrument(skip(self))]
    pub async fn check_expiry(&self) -> VigilResult<bool> {
        let mut state = self.state.lock().await;
        if !state.expired(Utc::now()) {
            return Ok(false);
        }

        Self::disarm_locked(&self.audit, &mut state).await?;
        drop(state);

        tracing::info!("Armed window passed; consent disarmed");
        self.audit
            .record_event("consent", "consent_expired", json!({}))
            .await;
        Ok(true)
    }

    /// Apply a routed command intent.
    ///
    /// # Errors
    ///
    /// `UnknownCommandError` for [`IntentKind::Unknown`]; otherwise the
    /// errors of the dispatched operation.
    pub async fn apply(&self, intent: CommandIntent) -> VigilResult<ConsentLedgerEntry> {
        match intent.kind {
            IntentKind::Arm => self.arm(ArmCommand::default()).await,
            IntentKind::Disarm => self.disarm().await,
            IntentKind::SafeMode => Ok(self.safe_mode().await?.entry),
            IntentKind::Unknown => Err(UnknownCommandError::new(
                intent.raw_text,
                intent.source_channel,
            ))?,
        }
    }

    /// Disarm under an already-held state lock.
    ///
    /// Appends the entry before committing the in-memory state; an append
    /// failure leaves the previous state in place.
    async fn disarm_locked(
        audit: &AuditLog,
        state: &mut ConsentState,
    ) -> VigilResult<ConsentLedgerEntry> {
        let next = ConsentState::disarmed();
        let entry = next.to_entry(Utc::now());
        audit.append_ledger(&entry).await?;
        *state = next;
        Ok(entry)
    }
}

#[async_trait::async_trait]
impl ConsentGate for ConsentAuthority {
    /// True only if consent is active, unexpired, and the topic is allowed
    /// and not revoked, re-evaluated at call time, never from a cached
    /// flag.
    async fn is_action_allowed(&self, topic: &str) -> bool {
        let state = self.state.lock().await;
        state.permits(topic, Utc::now())
    }
}
