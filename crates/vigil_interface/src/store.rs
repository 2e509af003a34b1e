//! Persistence boundary: append-only stores.

use vigil_core::{ConsentLedgerEntry, EventLogEntry};
use vigil_error::VigilResult;

/// Append-only store for consent ledger entries.
///
/// The ordered sequence of entries is the sole durable authorization
/// history. `append` must be durable before it returns: the consent
/// authority treats a failed append as aborting the in-flight transition.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Durably append one ledger entry.
    async fn append(&self, entry: &ConsentLedgerEntry) -> VigilResult<()>;

    /// Read the full ordered ledger for replay.
    async fn read_all(&self) -> VigilResult<Vec<ConsentLedgerEntry>>;

    /// Number of entries appended so far.
    async fn len(&self) -> VigilResult<usize>;
}

/// Append-only store for event log entries.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event record.
    async fn append(&self, entry: &EventLogEntry) -> VigilResult<()>;

    /// Read the full ordered event log.
    async fn read_all(&self) -> VigilResult<Vec<EventLogEntry>>;
}
