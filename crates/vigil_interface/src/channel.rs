//! Control-channel adapter boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_error::VigilResult;

/// Identifier of an outbound message, as reported by the channel.
pub type MessageId = String;

/// One raw inbound message from a control channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundCommand {
    /// Channel the message arrived on
    pub channel_id: String,
    /// Raw message text
    pub text: String,
    /// Arrival timestamp
    pub ts: DateTime<Utc>,
}

/// A control channel the operator issues commands through.
///
/// Implemented by the Discord-equivalent and Telegram-equivalent adapters.
/// The command router consumes the inbound side; confirmation and error
/// replies are sent by the embedding process, never by the core itself.
#[async_trait::async_trait]
pub trait ControlChannel: Send + Sync {
    /// The adapter's channel name (e.g. "discord", "telegram").
    fn name(&self) -> &str;

    /// Receive the next inbound message.
    ///
    /// Returns `None` when the channel has closed.
    async fn recv(&mut self) -> VigilResult<Option<InboundCommand>>;

    /// Send a message to a channel.
    async fn send(&self, channel_id: &str, text: &str) -> VigilResult<MessageId>;
}
