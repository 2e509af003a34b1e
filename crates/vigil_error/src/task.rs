//! Scheduler task error types.

/// Error for a scheduling request whose idempotency key collides with a task
/// that is still pending or firing.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Duplicate Task: key '{}' already scheduled as {} at line {} in {}", idempotency_key, existing_task_id, line, file)]
pub struct DuplicateTaskError {
    /// The colliding idempotency key
    pub idempotency_key: String,
    /// Id of the task already holding the key
    pub existing_task_id: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl DuplicateTaskError {
    /// Create a new DuplicateTaskError at the current location.
    #[track_caller]
    pub fn new(idempotency_key: impl Into<String>, existing_task_id: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            idempotency_key: idempotency_key.into(),
            existing_task_id: existing_task_id.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Kinds of task execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TaskErrorKind {
    /// The descriptor names an action no one registered
    #[display("Action not registered: {}", _0)]
    ActionNotRegistered(String),
    /// The action ran and returned an error
    #[display("Action '{}' failed: {}", action, reason)]
    ActionFailed {
        /// Registered action name
        action: String,
        /// Error reported by the action
        reason: String,
    },
}

/// Task execution error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Task Error: {} at line {} in {}", kind, line, file)]
pub struct TaskError {
    /// The kind of error that occurred
    pub kind: TaskErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TaskError {
    /// Create a new task error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TaskErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
