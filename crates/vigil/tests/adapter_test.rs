//! Exercises the adapter boundaries with scripted in-memory adapters:
//! channel-driven command flow, scheduled message delivery, scheduled
//! posting, and device event observation.

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use vigil::{
    ActionDescriptor, ActionRegistry, DeviceEvent, DeviceEventSource, InboundCommand, MessageId,
    PostId, PostingClient, PublishPostAction, Runtime, SendMessageAction, TaskStatus, VigilConfig,
    VigilResult,
};
use vigil_interface::ControlChannel;

/// Control channel fed from a script, recording everything sent.
struct ScriptedChannel {
    inbound: Mutex<VecDeque<InboundCommand>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedChannel {
    fn new(lines: &[&str]) -> Self {
        let inbound = lines
            .iter()
            .map(|text| InboundCommand {
                channel_id: "ops".to_string(),
                text: (*text).to_string(),
                ts: Utc::now(),
            })
            .collect();
        Self {
            inbound: Mutex::new(inbound),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait::async_trait]
impl ControlChannel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recv(&mut self) -> VigilResult<Option<InboundCommand>> {
        Ok(self.inbound.lock().pop_front())
    }

    async fn send(&self, channel_id: &str, text: &str) -> VigilResult<MessageId> {
        self.sent
            .lock()
            .push((channel_id.to_string(), text.to_string()));
        Ok(format!("msg-{}", self.sent.lock().len()))
    }
}

/// Posting client recording published posts.
#[derive(Default)]
struct RecordingPoster {
    posts: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl PostingClient for RecordingPoster {
    fn name(&self) -> &str {
        "recording"
    }

    async fn post(&self, text: &str, _media: Option<&[String]>) -> VigilResult<PostId> {
        self.posts.lock().push(text.to_string());
        Ok(format!("post-{}", self.posts.lock().len()))
    }
}

/// Device source replaying a fixed set of events.
struct ScriptedDevice {
    events: VecDeque<DeviceEvent>,
}

#[async_trait::async_trait]
impl DeviceEventSource for ScriptedDevice {
    fn name(&self) -> &str {
        "device-sim"
    }

    async fn recv(&mut self) -> VigilResult<Option<DeviceEvent>> {
        Ok(self.events.pop_front())
    }
}

fn memory_config(dir: &tempfile::TempDir) -> VigilConfig {
    let path = dir.path().join("vigil.toml");
    std::fs::write(&path, "persist_state = false\nexpiry_tick_seconds = 1\n").unwrap();
    VigilConfig::load(&path).unwrap()
}

#[tokio::test]
async fn channel_commands_drive_the_authority_and_get_replies() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Runtime::start(&memory_config(&dir), ActionRegistry::new())
        .await
        .unwrap();

    let mut channel = ScriptedChannel::new(&["arm", "feed the cat", "SAFE MODE"]);
    let sent = channel.sent.clone();
    runtime.drive_channel(&mut channel).await.unwrap();

    let replies = sent.lock();
    assert_eq!(replies.len(), 3);
    assert!(replies[0].1.contains("ARMED"));
    assert!(replies[1].1.contains("Unknown command"));
    assert!(replies[2].1.contains("SAFE MODE"));

    // ARM and SAFE MODE each appended; the unknown line did not.
    assert_eq!(runtime.audit().ledger_len().await.unwrap(), 2);
    assert!(!runtime.authority().state().await.active);

    runtime.shutdown().await;
}

#[tokio::test]
async fn scheduled_message_goes_out_through_the_channel() {
    let dir = tempfile::tempdir().unwrap();
    let channel = Arc::new(ScriptedChannel::new(&[]));
    let sent = channel.sent.clone();

    let mut registry = ActionRegistry::new();
    registry.register(SendMessageAction::new(channel));
    let runtime = Runtime::start(&memory_config(&dir), registry).await.unwrap();

    let id = runtime
        .scheduler()
        .schedule_at(
            Utc::now() + Duration::milliseconds(40),
            ActionDescriptor::new(
                "channel.send_message",
                json!({"channel_id": "ops", "text": "reminder: stretch"}),
            ),
            "stretch-reminder",
        )
        .await
        .unwrap();

    for _ in 0..100 {
        if runtime.scheduler().task(id).map(|task| task.status) == Some(TaskStatus::Completed) {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert_eq!(
        runtime.scheduler().task(id).unwrap().status,
        TaskStatus::Completed
    );
    assert_eq!(
        *sent.lock(),
        vec![("ops".to_string(), "reminder: stretch".to_string())]
    );

    runtime.shutdown().await;
}

#[tokio::test]
async fn scheduled_post_publishes_and_missing_args_fail() {
    let dir = tempfile::tempdir().unwrap();
    let poster = Arc::new(RecordingPoster::default());

    let mut registry = ActionRegistry::new();
    registry.register(PublishPostAction::new(poster.clone()));
    let runtime = Runtime::start(&memory_config(&dir), registry).await.unwrap();

    let good = runtime
        .scheduler()
        .schedule_at(
            Utc::now() + Duration::milliseconds(30),
            ActionDescriptor::new("posting.publish", json!({"text": "hello sky"})),
            "good-post",
        )
        .await
        .unwrap();
    let bad = runtime
        .scheduler()
        .schedule_at(
            Utc::now() + Duration::milliseconds(30),
            ActionDescriptor::new("posting.publish", json!({"caption": "no text field"})),
            "bad-post",
        )
        .await
        .unwrap();

    for _ in 0..100 {
        let done = [good, bad].iter().all(|id| {
            runtime
                .scheduler()
                .task(*id)
                .map(|task| task.status.is_resolved())
                .unwrap_or(false)
        });
        if done {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }

    assert_eq!(
        runtime.scheduler().task(good).unwrap().status,
        TaskStatus::Completed
    );
    assert_eq!(
        runtime.scheduler().task(bad).unwrap().status,
        TaskStatus::Failed
    );
    assert_eq!(*poster.posts.lock(), vec!["hello sky".to_string()]);

    runtime.shutdown().await;
}

#[tokio::test]
async fn device_events_land_in_the_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Runtime::start(&memory_config(&dir), ActionRegistry::new())
        .await
        .unwrap();

    let mut source = ScriptedDevice {
        events: VecDeque::from([DeviceEvent {
            device_id: "toy-1".to_string(),
            kind: "connected".to_string(),
            payload: json!({"battery": 80}),
            ts: Utc::now(),
        }]),
    };
    runtime.drive_device_events(&mut source).await.unwrap();

    let events = runtime.audit().read_events().await.unwrap();
    let device_event = events
        .iter()
        .find(|event| event.kind == "device_event")
        .unwrap();
    assert_eq!(device_event.source, "device-sim");
    assert_eq!(device_event.payload["device_id"], "toy-1");

    runtime.shutdown().await;
}
