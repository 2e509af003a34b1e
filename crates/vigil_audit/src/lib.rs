//! Append-only audit ledger and event log.
//!
//! [`AuditLog`] is the single write path for both record kinds: consent
//! ledger entries are strict (a failed append aborts the transition that
//! produced it), event log entries are best-effort (an append failure is
//! logged and swallowed). Payloads are redacted before they touch storage.
//!
//! Two store backends are provided: JSONL files for durable operation and
//! in-memory vectors for tests and ephemeral runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod jsonl;
mod memory;

pub use audit::AuditLog;
pub use jsonl::{JsonlEventStore, JsonlLedgerStore};
pub use memory::{MemoryEventStore, MemoryLedgerStore};
