//! Cancelable one-shot task scheduler.
//!
//! [`TaskScheduler`] owns an arena of [`vigil_core::ScheduledTask`] records
//! indexed by id; callers hold ids, never records. A single timer loop
//! sleeps until the next deadline, claims due tasks, and executes each
//! action on a spawned task so a hanging external call cannot stall the
//! loop. Consent-gated actions re-validate through
//! [`vigil_interface::ConsentGate`] at fire time, not at schedule time.
//!
//! Execution is at-most-once per task id: only the pending → firing
//! transition claims a task, and a resolved task can never fire again.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod persistence;
mod registry;
mod scheduler;

pub use persistence::{JsonTaskStore, MemoryTaskStore, TaskStore};
pub use registry::{ActionRegistry, ScheduledAction};
pub use scheduler::TaskScheduler;
