//! Scheduled task records.

use crate::ActionDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a scheduled task.
///
/// Callers hold ids, never task records; the scheduler owns the records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh task id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a one-shot task.
///
/// Transitions: `Pending → Firing → {Completed, Failed}`, or
/// `Pending → Canceled`. A task that reached `Firing` is past the point of
/// cancellation; a resolved task can never fire again.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its run time
    Pending,
    /// Claimed by the firing loop; no longer cancelable
    Firing,
    /// Action executed successfully
    Completed,
    /// Canceled before firing
    Canceled,
    /// Action failed or was denied; never retried automatically
    Failed,
}

impl TaskStatus {
    /// Whether the task has reached a terminal status.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

/// A one-shot, time-triggered task.
///
/// Owned exclusively by the scheduler; referenced externally by [`TaskId`]
/// alone. The action descriptor is opaque to the scheduler, which resolves
/// it through the action registry only at fire time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task id
    pub id: TaskId,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task should fire (UTC)
    pub run_at: DateTime<Utc>,
    /// What to do when the task fires
    pub action: ActionDescriptor,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Caller-supplied key for duplicate detection
    pub idempotency_key: String,
    /// Error recorded on failure
    pub error: Option<String>,
}

impl ScheduledTask {
    /// Create a pending task due at `run_at`.
    pub fn new(run_at: DateTime<Utc>, action: ActionDescriptor, idempotency_key: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            created_at: Utc::now(),
            run_at,
            action,
            status: TaskStatus::Pending,
            idempotency_key: idempotency_key.into(),
            error: None,
        }
    }
}
