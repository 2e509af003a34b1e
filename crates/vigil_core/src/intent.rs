//! Command intents produced by the router.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authorization intents a control channel can express.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    /// Grant consent for a window
    Arm,
    /// Revoke consent
    Disarm,
    /// Revoke consent and cancel all pending scheduled work
    SafeMode,
    /// Unrecognized text; never forwarded to the authority
    Unknown,
}

/// A normalized inbound command.
///
/// Ephemeral: produced by the command router, consumed immediately by the
/// consent authority, never persisted as its own entity. The resulting
/// ledger entry is the durable trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandIntent {
    /// What the text asked for
    pub kind: IntentKind,
    /// Channel the text arrived on
    pub source_channel: String,
    /// The raw inbound text
    pub raw_text: String,
    /// When the text arrived
    pub ts: DateTime<Utc>,
}

impl CommandIntent {
    /// Build an intent from routed inbound text.
    pub fn new(
        kind: IntentKind,
        source_channel: impl Into<String>,
        raw_text: impl Into<String>,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            source_channel: source_channel.into(),
            raw_text: raw_text.into(),
            ts,
        }
    }
}
