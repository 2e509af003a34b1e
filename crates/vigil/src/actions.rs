//! Scheduled actions bridging to the adapter boundaries.
//!
//! These are the registrable side effects one-shot tasks perform: sending a
//! message through a control channel and publishing through a posting
//! adapter. Each resolves its adapter at fire time through the handle it
//! was constructed with; the scheduler itself never sees a concrete client.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use vigil_error::{ChannelError, VigilResult};
use vigil_interface::{ControlChannel, PostingClient};
use vigil_scheduler::ScheduledAction;

fn required_str<'a>(args: &'a JsonValue, field: &str, action: &str) -> VigilResult<&'a str> {
    args.get(field)
        .and_then(|value| value.as_str())
        .ok_or_else(|| ChannelError::new(format!("{action} requires string argument '{field}'")).into())
}

/// Sends a message through a control channel when its task fires.
///
/// Arguments: `{"channel_id": "...", "text": "..."}`.
pub struct SendMessageAction {
    channel: Arc<dyn ControlChannel>,
}

impl SendMessageAction {
    /// Wrap a control channel as the `channel.send_message` action.
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait::async_trait]
impl ScheduledAction for SendMessageAction {
    fn name(&self) -> &str {
        "channel.send_message"
    }

    #[tracing::instrument(skip(self, args))]
    async fn run(&self, args: &JsonValue) -> VigilResult<()> {
        let channel_id = required_str(args, "channel_id", "channel.send_message")?;
        let text = required_str(args, "text", "channel.send_message")?;
        let message_id = self.channel.send(channel_id, text).await?;
        tracing::info!(channel_id, message_id = %message_id, "Scheduled message delivered");
        Ok(())
    }
}

/// Publishes through a posting adapter when its task fires.
///
/// Arguments: `{"text": "...", "media": ["ref", ...]}` (media optional).
pub struct PublishPostAction {
    poster: Arc<dyn PostingClient>,
}

impl PublishPostAction {
    /// Wrap a posting client as the `posting.publish` action.
    pub fn new(poster: Arc<dyn PostingClient>) -> Self {
        Self { poster }
    }
}

#[async_trait::async_trait]
impl ScheduledAction for PublishPostAction {
    fn name(&self) -> &str {
        "posting.publish"
    }

    #[tracing::instrument(skip(self, args))]
    async fn run(&self, args: &JsonValue) -> VigilResult<()> {
        let text = required_str(args, "text", "posting.publish")?;
        let media: Option<Vec<String>> = args.get("media").and_then(|value| {
            value
                .as_array()
                .map(|refs| {
                    refs.iter()
                        .filter_map(|item| item.as_str().map(String::from))
                        .collect()
                })
        });
        let post_id = self.poster.post(text, media.as_deref()).await?;
        tracing::info!(post_id = %post_id, "Scheduled post published");
        Ok(())
    }
}
