//! Component wiring and lifecycle.

use crate::VigilConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vigil_audit::{
    AuditLog, JsonlEventStore, JsonlLedgerStore, MemoryEventStore, MemoryLedgerStore,
};
use vigil_consent::ConsentAuthority;
use vigil_control::{CommandRouter, ExpiryWatcher};
use vigil_core::IntentKind;
use vigil_error::VigilResult;
use vigil_interface::{
    ConsentGate, ControlChannel, DeviceEventSource, EventStore, LedgerStore, PendingTaskCanceler,
};
use vigil_scheduler::{ActionRegistry, JsonTaskStore, MemoryTaskStore, TaskScheduler, TaskStore};

/// The assembled core: authority, scheduler, router, watcher.
///
/// Startup order mirrors the dependency order: stores, audit log, authority
/// (recovered from the ledger), scheduler (gated by the authority, attached
/// back as its canceler), then the background loops. Pending tasks restore
/// last so their pre-fire checks run against the recovered authority.
pub struct Runtime {
    audit: AuditLog,
    authority: Arc<ConsentAuthority>,
    scheduler: TaskScheduler,
    router: CommandRouter,
    handles: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Build and start the core from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a store cannot be opened, the ledger replay fails,
    /// or task restoration fails.
    #[tracing::instrument(skip(config, registry))]
    pub async fn start(config: &VigilConfig, registry: ActionRegistry) -> VigilResult<Self> {
        for warning in config.validate() {
            tracing::warn!(warning, "Configuration warning");
        }

        let (ledger, events, tasks): (
            Arc<dyn LedgerStore>,
            Arc<dyn EventStore>,
            Arc<dyn TaskStore>,
        ) = if *config.persist_state() {
            (
                Arc::new(JsonlLedgerStore::create(config.ledger_path())?),
                Arc::new(JsonlEventStore::create(config.events_path())?),
                Arc::new(JsonTaskStore::create(config.tasks_path())?),
            )
        } else {
            (
                Arc::new(MemoryLedgerStore::new()),
                Arc::new(MemoryEventStore::new()),
                Arc::new(MemoryTaskStore::new()),
            )
        };

        let audit = AuditLog::new(ledger, events);
        let authority = ConsentAuthority::recover(audit.clone()).await?;

        let scheduler = TaskScheduler::new(
            registry,
            authority.clone() as Arc<dyn ConsentGate>,
            tasks,
            audit.clone(),
        );
        authority.attach_canceler(Arc::new(scheduler.clone()) as Arc<dyn PendingTaskCanceler>);

        let mut handles = vec![scheduler.spawn()];

        if *config.persist_state() && *config.restore_tasks() {
            let restored = scheduler.restore_pending().await?;
            tracing::info!(restored, "Task restoration complete");
        }

        let tick = Duration::from_secs((*config.expiry_tick_seconds()).max(1));
        handles.push(ExpiryWatcher::new(authority.clone(), tick).spawn());

        let router = CommandRouter::new(authority.clone(), audit.clone());

        audit
            .record_event("runtime", "startup_complete", json!({}))
            .await;
        tracing::info!("Runtime started");

        Ok(Self {
            audit,
            authority,
            scheduler,
            router,
            handles,
        })
    }

    /// The audit log.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The consent authority.
    pub fn authority(&self) -> &Arc<ConsentAuthority> {
        &self.authority
    }

    /// The task scheduler.
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// The command router.
    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Drain a control channel, routing each inbound message.
    ///
    /// Confirmation and error replies go back through the same channel, in
    /// the role of the embedding process; the core components themselves
    /// never send. Returns when the channel closes.
    #[tracing::instrument(skip(self, channel), fields(channel = channel.name()))]
    pub async fn drive_channel(&self, channel: &mut dyn ControlChannel) -> VigilResult<()> {
        while let Some(inbound) = channel.recv().await? {
            let kind = CommandRouter::parse(&inbound.text);
            let reply = match self
                .router
                .route(&inbound.channel_id, &inbound.text, inbound.ts)
                .await
            {
                Ok(Some(entry)) => match kind {
                    IntentKind::Arm => match entry.armed_until {
                        Some(until) => format!("Consent ARMED until {}", until.to_rfc3339()),
                        None => "Consent ARMED".to_string(),
                    },
                    IntentKind::Disarm => "Consent DISARMED".to_string(),
                    IntentKind::SafeMode => {
                        "SAFE MODE ACTIVATED - all consent disabled, tasks canceled".to_string()
                    }
                    IntentKind::Unknown => continue,
                },
                Ok(None) => format!(
                    "Unknown command: {}\nAvailable: ARM, DISARM, SAFE MODE",
                    inbound.text.trim()
                ),
                Err(e) => {
                    self.audit
                        .record_error(
                            "runtime",
                            &e.to_string(),
                            Some(json!({"channel": inbound.channel_id})),
                        )
                        .await;
                    format!("Command failed: {e}")
                }
            };

            match channel.send(&inbound.channel_id, &reply).await {
                Ok(_) => {
                    self.audit
                        .record_message_sent(channel.name(), &inbound.channel_id, Some(&reply))
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, channel = channel.name(), "Failed to send reply");
                }
            }
        }
        Ok(())
    }

    /// Drain a device event source into the event log.
    ///
    /// Strictly observational: no command path back to the device exists at
    /// this boundary. Returns when the stream closes.
    #[tracing::instrument(skip(self, source), fields(source = source.name()))]
    pub async fn drive_device_events(
        &self,
        source: &mut dyn DeviceEventSource,
    ) -> VigilResult<()> {
        while let Some(event) = source.recv().await? {
            tracing::debug!(device = %event.device_id, kind = %event.kind, "Device event");
            self.audit
                .record_event(
                    source.name(),
                    "device_event",
                    json!({
                        "device_id": event.device_id,
                        "kind": event.kind,
                        "payload": event.payload,
                    }),
                )
                .await;
        }
        Ok(())
    }

    /// Stop the background loops.
    ///
    /// Pending tasks stay pending in the store; they restore on the next
    /// start, where their gates re-validate against recovered consent.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(self) {
        self.audit
            .record_event("runtime", "shutdown_started", json!({}))
            .await;
        for handle in &self.handles {
            handle.abort();
        }
        self.audit
            .record_event("runtime", "shutdown_complete", json!({}))
            .await;
        tracing::info!("Runtime stopped");
    }
}
