//! Action descriptors for scheduled work.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// What a scheduled task does when it fires.
///
/// Opaque to the scheduler: `action` names an entry in the action registry,
/// `args` is passed to it verbatim, and `gate_topic` (if present) is
/// re-validated against the consent authority at fire time, not at schedule
/// time. Keeping side effects behind a registered-action lookup decouples
/// the scheduler from concrete external clients.
///
/// # Examples
///
/// ```
/// use vigil_core::ActionDescriptor;
/// use serde_json::json;
///
/// let action = ActionDescriptor::gated("device.pulse", json!({"level": 3}), "device");
/// assert_eq!(action.gate_topic.as_deref(), Some("device"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Registered action name (e.g. "discord.send_message", "bsky.post")
    pub action: String,
    /// Arguments handed to the action
    pub args: JsonValue,
    /// Consent topic to re-validate at fire time, if the action is gated
    pub gate_topic: Option<String>,
}

impl ActionDescriptor {
    /// An action with no consent gate.
    pub fn new(action: impl Into<String>, args: JsonValue) -> Self {
        Self {
            action: action.into(),
            args,
            gate_topic: None,
        }
    }

    /// An action gated on `topic` at fire time.
    pub fn gated(action: impl Into<String>, args: JsonValue, topic: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args,
            gate_topic: Some(topic.into()),
        }
    }
}
