//! Device event-source boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use vigil_error::VigilResult;

/// One event observed from a device adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Which device reported the event
    pub device_id: String,
    /// Event kind as reported by the adapter
    pub kind: String,
    /// Adapter-specific payload
    pub payload: JsonValue,
    /// Observation timestamp
    pub ts: DateTime<Utc>,
}

/// A read-only stream of device events.
///
/// This boundary is deliberately one-directional: no command-issuing method
/// exists here, so the core cannot drive a device even by mistake. Device
/// commands, when they exist at all, belong to a later phase behind the
/// consent gate.
#[async_trait::async_trait]
pub trait DeviceEventSource: Send + Sync {
    /// The adapter's source name (e.g. "lovense").
    fn name(&self) -> &str;

    /// Receive the next device event.
    ///
    /// Returns `None` when the stream has closed.
    async fn recv(&mut self) -> VigilResult<Option<DeviceEvent>>;
}
