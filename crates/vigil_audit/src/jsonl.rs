//! JSONL file-backed stores.
//!
//! One JSON document per line, append-only. Appends are flushed and synced
//! before returning, so a ledger entry acknowledged to the caller survives a
//! crash.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use vigil_core::{ConsentLedgerEntry, EventLogEntry};
use vigil_error::{PersistenceError, PersistenceErrorKind, VigilResult};

/// Append-only JSONL file shared by both store types.
struct JsonlFile {
    path: PathBuf,
    // Serializes appends so concurrent writers cannot interleave lines.
    write_lock: Mutex<()>,
}

impl JsonlFile {
    fn create(path: impl Into<PathBuf>) -> VigilResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn append<T: Serialize>(&self, record: &T) -> VigilResult<()> {
        let mut line = serde_json::to_string(record).map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Serialization(e.to_string()))
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            })?;

        file.write_all(line.as_bytes()).await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })?;
        file.flush().await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                "flush {}: {}",
                self.path.display(),
                e
            )))
        })?;
        // Acknowledged appends must survive a crash.
        file.sync_data().await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                "sync {}: {}",
                self.path.display(),
                e
            )))
        })?;
        Ok(())
    }

    async fn read_all<T: DeserializeOwned>(&self) -> VigilResult<Vec<T>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PersistenceError::new(PersistenceErrorKind::ReadFailed(
                    format!("{}: {}", self.path.display(), e),
                ))
                .into());
            }
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    PersistenceError::new(PersistenceErrorKind::Serialization(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    )))
                    .into()
                })
            })
            .collect()
    }
}

/// Consent ledger persisted as a JSONL file.
///
/// # Examples
///
/// ```no_run
/// use vigil_audit::JsonlLedgerStore;
///
/// let store = JsonlLedgerStore::create("/var/vigil/consent_ledger.jsonl").unwrap();
/// # let _ = store;
/// ```
pub struct JsonlLedgerStore {
    file: JsonlFile,
}

impl JsonlLedgerStore {
    /// Open a ledger store at `path`, creating parent directories.
    #[tracing::instrument(skip(path))]
    pub fn create(path: impl AsRef<Path>) -> VigilResult<Self> {
        let file = JsonlFile::create(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened consent ledger store");
        Ok(Self { file })
    }
}

#[async_trait::async_trait]
impl vigil_interface::LedgerStore for JsonlLedgerStore {
    async fn append(&self, entry: &ConsentLedgerEntry) -> VigilResult<()> {
        self.file.append(entry).await
    }

    async fn read_all(&self) -> VigilResult<Vec<ConsentLedgerEntry>> {
        self.file.read_all().await
    }

    async fn len(&self) -> VigilResult<usize> {
        Ok(self.file.read_all::<ConsentLedgerEntry>().await?.len())
    }
}

/// Event log persisted as a JSONL file.
pub struct JsonlEventStore {
    file: JsonlFile,
}

impl JsonlEventStore {
    /// Open an event store at `path`, creating parent directories.
    #[tracing::instrument(skip(path))]
    pub fn create(path: impl AsRef<Path>) -> VigilResult<Self> {
        let file = JsonlFile::create(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened event log store");
        Ok(Self { file })
    }
}

#[async_trait::async_trait]
impl vigil_interface::EventStore for JsonlEventStore {
    async fn append(&self, entry: &EventLogEntry) -> VigilResult<()> {
        self.file.append(entry).await
    }

    async fn read_all(&self) -> VigilResult<Vec<EventLogEntry>> {
        self.file.read_all().await
    }
}
