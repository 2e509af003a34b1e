//! Vigil - Consent-Gated Automation Core
//!
//! Vigil is the authorization core for a social/device automation system: a
//! serialized consent state machine that gates physical-device actions, a
//! cancelable one-shot task scheduler whose pending work is revoked in
//! lockstep with authorization changes, and an append-only audit ledger
//! from which the full authorization history can be replayed.
//!
//! The governing policy is fail-safe: a crash, restart, or ambiguous state
//! always resolves toward "disabled," never toward "armed."
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vigil::{ActionRegistry, Runtime, VigilConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VigilConfig::load("vigil.toml")?;
//!     let runtime = Runtime::start(&config, ActionRegistry::new()).await?;
//!
//!     let entry = runtime
//!         .router()
//!         .route("discord", "ARM", chrono::Utc::now())
//!         .await?;
//!     println!("armed until {:?}", entry.and_then(|e| e.armed_until));
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Vigil is organized as a workspace with focused crates:
//!
//! - `vigil_error` - Error types
//! - `vigil_core` - Core data types (ConsentState, ScheduledTask, etc.)
//! - `vigil_interface` - Adapter and persistence trait boundaries
//! - `vigil_audit` - Append-only ledger and event log
//! - `vigil_consent` - The consent authority state machine
//! - `vigil_scheduler` - One-shot task scheduling
//! - `vigil_control` - Command routing and expiry watching
//!
//! This crate (`vigil`) wires the components together and re-exports
//! everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actions;
mod config;
mod runtime;

pub use actions::{PublishPostAction, SendMessageAction};
pub use config::VigilConfig;
pub use runtime::Runtime;

pub use vigil_audit::{
    AuditLog, JsonlEventStore, JsonlLedgerStore, MemoryEventStore, MemoryLedgerStore,
};
pub use vigil_consent::{ConsentAuthority, SafeModeReport};
pub use vigil_control::{CommandRouter, ExpiryWatcher};
pub use vigil_core::{
    ActionDescriptor, ArmCommand, ArmCommandBuilder, CommandIntent, ConsentLedgerEntry,
    ConsentState, DEVICE_TOPIC, EventLogEntry, IntentKind, ScheduledTask, TaskId, TaskStatus,
    default_arm_duration, init_tracing, redact_secrets, redact_value,
};
pub use vigil_error::{
    ChannelError, ConfigError, DuplicateTaskError, PersistenceError, PersistenceErrorKind,
    TaskError, TaskErrorKind, UnauthorizedActionError, UnknownCommandError, ValidationError,
    ValidationErrorKind, VigilError, VigilErrorKind, VigilResult,
};
pub use vigil_interface::{
    ConsentGate, ControlChannel, DeviceEvent, DeviceEventSource, EventStore, InboundCommand,
    LedgerStore, MessageId, PendingTaskCanceler, PostId, PostingClient,
};
pub use vigil_scheduler::{
    ActionRegistry, JsonTaskStore, MemoryTaskStore, ScheduledAction, TaskScheduler, TaskStore,
};
