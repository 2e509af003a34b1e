//! Core data types for the Vigil consent authorization core.
//!
//! This crate provides the foundation data types shared across the Vigil
//! workspace: the consent state machine's data model, the append-only ledger
//! and event records, scheduled task records, and command intents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod consent;
mod event;
mod intent;
mod redact;
mod task;
mod telemetry;

pub use action::ActionDescriptor;
pub use consent::{
    ArmCommand, ArmCommandBuilder, ConsentLedgerEntry, ConsentState, DEVICE_TOPIC,
    default_arm_duration,
};
pub use event::EventLogEntry;
pub use intent::{CommandIntent, IntentKind};
pub use redact::{redact_secrets, redact_value};
pub use task::{ScheduledTask, TaskId, TaskStatus};
pub use telemetry::init_tracing;
