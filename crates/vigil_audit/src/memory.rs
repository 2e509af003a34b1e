//! In-memory stores for tests and ephemeral runs.

use parking_lot::Mutex;
use vigil_core::{ConsentLedgerEntry, EventLogEntry};
use vigil_error::VigilResult;
use vigil_interface::{EventStore, LedgerStore};

/// Consent ledger held in memory.
///
/// Useful in tests and in runs that disable persistence; the replay
/// contract holds identically against it.
#[derive(Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<Vec<ConsentLedgerEntry>>,
}

impl MemoryLedgerStore {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn append(&self, entry: &ConsentLedgerEntry) -> VigilResult<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> VigilResult<Vec<ConsentLedgerEntry>> {
        Ok(self.entries.lock().clone())
    }

    async fn len(&self) -> VigilResult<usize> {
        Ok(self.entries.lock().len())
    }
}

/// Event log held in memory.
#[derive(Default)]
pub struct MemoryEventStore {
    entries: Mutex<Vec<EventLogEntry>>,
}

impl MemoryEventStore {
    /// Create an empty in-memory event log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, entry: &EventLogEntry) -> VigilResult<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> VigilResult<Vec<EventLogEntry>> {
        Ok(self.entries.lock().clone())
    }
}
