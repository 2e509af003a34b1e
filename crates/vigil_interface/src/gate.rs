//! Internal seams between the consent authority and the task scheduler.

/// Answers "is this action allowed right now."
///
/// Implemented by the consent authority; consulted by the scheduler at fire
/// time (never only at schedule time). Implementations must re-evaluate
/// expiry on every call and resolve any internal failure to denial.
#[async_trait::async_trait]
pub trait ConsentGate: Send + Sync {
    /// Whether `topic` is permitted at the instant of the call.
    async fn is_action_allowed(&self, topic: &str) -> bool;
}

/// Cancels all pending scheduled work.
///
/// Implemented by the task scheduler; invoked synchronously from within
/// `safe_mode` as part of the same logical transition. Must not deadlock
/// against a task that is mid-fire.
#[async_trait::async_trait]
pub trait PendingTaskCanceler: Send + Sync {
    /// Cancel every pending task; returns the count canceled.
    async fn cancel_all(&self) -> usize;
}
