//! Task metadata persistence.
//!
//! Task records survive restarts so pending work can be restored; the
//! restored task's consent gate is still re-validated at fire time, so a
//! window that expired during downtime denies execution.

use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use vigil_core::{ScheduledTask, TaskId, TaskStatus};
use vigil_error::{PersistenceError, PersistenceErrorKind, VigilResult};

/// Durable store for scheduled task metadata.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a newly created task.
    async fn save(&self, task: &ScheduledTask) -> VigilResult<()>;

    /// Persist a task's current state (status transitions, recorded errors).
    async fn update(&self, task: &ScheduledTask) -> VigilResult<()>;

    /// Load every task still pending.
    async fn load_pending(&self) -> VigilResult<Vec<ScheduledTask>>;
}

/// Task store backed by a single JSON file.
///
/// The whole task table is serialized on every write; writes go to a temp
/// file and are renamed into place so a crash never leaves a torn file.
pub struct JsonTaskStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonTaskStore {
    /// Open a task store at `path`, creating parent directories.
    #[tracing::instrument(skip(path))]
    pub fn create(path: impl AsRef<Path>) -> VigilResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        tracing::info!(path = %path.display(), "Opened task store");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_table(&self) -> VigilResult<HashMap<TaskId, ScheduledTask>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::Serialization(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PersistenceError::new(PersistenceErrorKind::ReadFailed(
                format!("{}: {}", self.path.display(), e),
            ))
            .into()),
        }
    }

    async fn write_table(&self, table: &HashMap<TaskId, ScheduledTask>) -> VigilResult<()> {
        let json = serde_json::to_string_pretty(table).map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Serialization(e.to_string()))
        })?;

        // Temp file + rename keeps the table atomic under crashes.
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::AppendFailed(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )))
        })?;
        Ok(())
    }

    async fn upsert(&self, task: &ScheduledTask) -> VigilResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.read_table().await?;
        table.insert(task.id, task.clone());
        self.write_table(&table).await
    }
}

#[async_trait::async_trait]
impl TaskStore for JsonTaskStore {
    async fn save(&self, task: &ScheduledTask) -> VigilResult<()> {
        self.upsert(task).await
    }

    async fn update(&self, task: &ScheduledTask) -> VigilResult<()> {
        self.upsert(task).await
    }

    async fn load_pending(&self) -> VigilResult<Vec<ScheduledTask>> {
        let table = self.read_table().await?;
        Ok(table
            .into_values()
            .filter(|task| task.status == TaskStatus::Pending)
            .collect())
    }
}

/// Task store held in memory, for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: SyncMutex<HashMap<TaskId, ScheduledTask>>,
}

impl MemoryTaskStore {
    /// Create an empty in-memory task store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored task by id.
    pub fn get(&self, id: TaskId) -> Option<ScheduledTask> {
        self.tasks.lock().get(&id).cloned()
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, task: &ScheduledTask) -> VigilResult<()> {
        self.tasks.lock().insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &ScheduledTask) -> VigilResult<()> {
        self.tasks.lock().insert(task.id, task.clone());
        Ok(())
    }

    async fn load_pending(&self) -> VigilResult<Vec<ScheduledTask>> {
        Ok(self
            .tasks
            .lock()
            .values()
            .filter(|task| task.status == TaskStatus::Pending)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use vigil_core::ActionDescriptor;

    fn task(offset_secs: i64) -> ScheduledTask {
        ScheduledTask::new(
            Utc::now() + Duration::seconds(offset_secs),
            ActionDescriptor::new("test.noop", serde_json::json!({})),
            format!("key-{offset_secs}"),
        )
    }

    #[tokio::test]
    async fn json_store_round_trips_pending_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::create(dir.path().join("tasks.json")).unwrap();

        let pending = task(60);
        let mut resolved = task(120);
        resolved.status = TaskStatus::Completed;

        store.save(&pending).await.unwrap();
        store.save(&resolved).await.unwrap();

        let loaded = store.load_pending().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, pending.id);
    }

    #[tokio::test]
    async fn json_store_update_overwrites_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::create(dir.path().join("tasks.json")).unwrap();

        let mut task = task(60);
        store.save(&task).await.unwrap();

        task.status = TaskStatus::Canceled;
        store.update(&task).await.unwrap();

        assert!(store.load_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::create(dir.path().join("absent.json")).unwrap();
        assert!(store.load_pending().await.unwrap().is_empty());
    }
}
