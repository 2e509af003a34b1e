//! Safe mode is the system's strongest guarantee: disarm plus cancellation
//! of every pending task, atomic from the caller's perspective.

use chrono::{Duration, Utc};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vigil::{
    ActionDescriptor, ActionRegistry, Runtime, ScheduledAction, TaskStatus, VigilConfig,
    VigilResult,
};

struct SendMessageAction {
    sends: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ScheduledAction for SendMessageAction {
    fn name(&self) -> &str {
        "messaging.send"
    }

    async fn run(&self, _args: &JsonValue) -> VigilResult<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn memory_config(dir: &tempfile::TempDir) -> VigilConfig {
    let path = dir.path().join("vigil.toml");
    std::fs::write(&path, "persist_state = false\nexpiry_tick_seconds = 1\n").unwrap();
    VigilConfig::load(&path).unwrap()
}

fn registry(sends: &Arc<AtomicUsize>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(SendMessageAction {
        sends: sends.clone(),
    });
    registry
}

#[tokio::test]
async fn safe_mode_cancels_pending_and_spares_later_work() {
    let dir = tempfile::tempdir().unwrap();
    let sends = Arc::new(AtomicUsize::new(0));
    let runtime = Runtime::start(&memory_config(&dir), registry(&sends))
        .await
        .unwrap();

    let run_at = Utc::now() + Duration::seconds(60);
    let task_id = runtime
        .scheduler()
        .schedule_at(
            run_at,
            ActionDescriptor::new("messaging.send", json!({"text": "hello"})),
            "pending-send",
        )
        .await
        .unwrap();

    let report = runtime.authority().safe_mode().await.unwrap();
    assert_eq!(report.canceled_tasks, 1);

    let task = runtime.scheduler().task(task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Canceled);
    assert_eq!(sends.load(Ordering::SeqCst), 0);

    // The disarm entry is timestamped before the task would have fired.
    assert!(report.entry.ts < run_at);
    assert!(!report.entry.active);

    // Work scheduled strictly after safe_mode returns is unaffected.
    let later_id = runtime
        .scheduler()
        .schedule_at(
            Utc::now() + Duration::seconds(60),
            ActionDescriptor::new("messaging.send", json!({"text": "later"})),
            "later-send",
        )
        .await
        .unwrap();
    assert_eq!(
        runtime.scheduler().task(later_id).unwrap().status,
        TaskStatus::Pending
    );

    runtime.shutdown().await;
}

#[tokio::test]
async fn safe_mode_cancels_every_pending_task() {
    let dir = tempfile::tempdir().unwrap();
    let sends = Arc::new(AtomicUsize::new(0));
    let runtime = Runtime::start(&memory_config(&dir), registry(&sends))
        .await
        .unwrap();

    for n in 0..10 {
        runtime
            .scheduler()
            .schedule_at(
                Utc::now() + Duration::seconds(120 + n),
                ActionDescriptor::new("messaging.send", json!({"n": n})),
                format!("bulk-{n}"),
            )
            .await
            .unwrap();
    }
    assert_eq!(runtime.scheduler().pending_count(), 10);

    let report = runtime.authority().safe_mode().await.unwrap();
    assert_eq!(report.canceled_tasks, 10);
    assert_eq!(runtime.scheduler().pending_count(), 0);
    assert_eq!(sends.load(Ordering::SeqCst), 0);

    runtime.shutdown().await;
}

#[tokio::test]
async fn safe_mode_text_from_a_channel_drives_the_full_transition() {
    let dir = tempfile::tempdir().unwrap();
    let sends = Arc::new(AtomicUsize::new(0));
    let runtime = Runtime::start(&memory_config(&dir), registry(&sends))
        .await
        .unwrap();

    runtime
        .router()
        .route("discord", "arm", Utc::now())
        .await
        .unwrap();
    runtime
        .scheduler()
        .schedule_at(
            Utc::now() + Duration::seconds(60),
            ActionDescriptor::gated("messaging.send", json!({}), "device"),
            "gated-send",
        )
        .await
        .unwrap();

    let entry = runtime
        .router()
        .route("discord", "Safe Mode", Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.active);
    assert_eq!(runtime.scheduler().pending_count(), 0);
    assert_eq!(sends.load(Ordering::SeqCst), 0);

    runtime.shutdown().await;
}
