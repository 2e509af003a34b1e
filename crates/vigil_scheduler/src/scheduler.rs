//! The one-shot task scheduler.

use crate::{ActionRegistry, TaskStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use vigil_audit::AuditLog;
use vigil_core::{ActionDescriptor, ScheduledTask, TaskId, TaskStatus};
use vigil_error::{
    DuplicateTaskError, TaskError, TaskErrorKind, UnauthorizedActionError, ValidationError,
    ValidationErrorKind, VigilResult,
};
use vigil_interface::{ConsentGate, PendingTaskCanceler};

/// Manages one-shot, time-triggered actions.
///
/// Tasks live in an arena indexed by [`TaskId`], mutated only through the
/// scheduler; callers hold ids alone. A single timer loop wakes at the next
/// due time (or when scheduling changes it) and claims due tasks in
/// `run_at` order; each claimed action executes on its own spawned task.
///
/// Claiming and cancellation are mutually exclusive under the arena lock:
/// a task is either canceled while pending or claimed into firing, never
/// both. Once firing, it is past the point of cancellation.
#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    arena: Mutex<HashMap<TaskId, ScheduledTask>>,
    registry: ActionRegistry,
    gate: Arc<dyn ConsentGate>,
    store: Arc<dyn TaskStore>,
    audit: AuditLog,
    // Wakes the timer loop when the next deadline may have changed.
    notify: Notify,
}

impl TaskScheduler {
    /// Create a scheduler over the given collaborators.
    pub fn new(
        registry: ActionRegistry,
        gate: Arc<dyn ConsentGate>,
        store: Arc<dyn TaskStore>,
        audit: AuditLog,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                arena: Mutex::new(HashMap::new()),
                registry,
                gate,
                store,
                audit,
                notify: Notify::new(),
            }),
        }
    }

    /// Schedule a one-shot task.
    ///
    /// Returns the durable task id immediately; the action never executes
    /// on the caller's stack.
    ///
    /// # Errors
    ///
    /// `ValidationError` if `run_at` is not in the future or the
    /// idempotency key is empty; `DuplicateTaskError` if an equivalent task
    /// is already pending or firing; `PersistenceError` if the task cannot
    /// be saved (the task is not scheduled).
    #[tracing::instrument(skip(self, action), fields(action = %action.action))]
    pub async fn schedule_at(
        &self,
        run_at: DateTime<Utc>,
        action: ActionDescriptor,
        idempotency_key: impl Into<String> + std::fmt::Debug,
    ) -> VigilResult<TaskId> {
        let idempotency_key = idempotency_key.into();
        let now = Utc::now();
        if run_at <= now {
            return Err(ValidationError::new(ValidationErrorKind::PastScheduleTime {
                when: run_at.to_rfc3339(),
                now: now.to_rfc3339(),
            }))?;
        }
        if idempotency_key.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::EmptyField(
                "idempotency_key".to_string(),
            )))?;
        }

        let task = ScheduledTask::new(run_at, action, idempotency_key.clone());
        let task_id = task.id;

        {
            let mut arena = self.inner.arena.lock();
            if let Some(existing) = arena.values().find(|candidate| {
                candidate.idempotency_key == idempotency_key
                    && matches!(candidate.status, TaskStatus::Pending | TaskStatus::Firing)
            }) {
                return Err(DuplicateTaskError::new(
                    idempotency_key,
                    existing.id.to_string(),
                ))?;
            }
            arena.insert(task_id, task.clone());
        }

        if let Err(e) = self.inner.store.save(&task).await {
            // Unschedule rather than hold a task the store never saw.
            self.inner.arena.lock().remove(&task_id);
            return Err(e);
        }

        self.inner.notify.notify_waiters();
        tracing::info!(%task_id, run_at = %run_at, "Task scheduled");
        self.inner
            .audit
            .record_event(
                "scheduler",
                "task_scheduled",
                json!({
                    "task_id": task_id.to_string(),
                    "run_at": run_at,
                    "action": task.action.action,
                }),
            )
            .await;
        Ok(task_id)
    }

    /// Cancel a pending task.
    ///
    /// Returns `false`, not an error, if the task is unknown or already
    /// resolved; cancellation races are expected and silent.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, task_id: TaskId) -> bool {
        let canceled = {
            let mut arena = self.inner.arena.lock();
            match arena.get_mut(&task_id) {
                Some(task) if task.status == TaskStatus::Pending => {
                    task.status = TaskStatus::Canceled;
                    Some(task.clone())
                }
                _ => None,
            }
        };

        let Some(task) = canceled else {
            tracing::debug!(%task_id, "Cancel ignored; task unknown or already resolved");
            return false;
        };

        self.persist_update(&task).await;
        self.inner.notify.notify_waiters();
        tracing::info!(%task_id, "Task canceled");
        self.inner
            .audit
            .record_event(
                "scheduler",
                "task_canceled",
                json!({"task_id": task_id.to_string()}),
            )
            .await;
        true
    }

    /// Cancel every pending task; returns the count canceled.
    ///
    /// Atomic with respect to the firing loop: claiming and canceling both
    /// take the arena lock, so after this returns nothing pending remains
    /// and only tasks already mid-fire may still run (their consent gates
    /// re-validate against the already-updated authority state).
    #[tracing::instrument(skip(self))]
    pub async fn cancel_all_pending(&self) -> usize {
        let canceled: Vec<ScheduledTask> = {
            let mut arena = self.inner.arena.lock();
            arena
                .values_mut()
                .filter(|task| task.status == TaskStatus::Pending)
                .map(|task| {
                    task.status = TaskStatus::Canceled;
                    task.clone()
                })
                .collect()
        };

        for task in &canceled {
            self.persist_update(task).await;
        }
        self.inner.notify.notify_waiters();

        tracing::info!(count = canceled.len(), "Canceled all pending tasks");
        self.inner
            .audit
            .record_event(
                "scheduler",
                "all_tasks_canceled",
                json!({"count": canceled.len()}),
            )
            .await;
        canceled.len()
    }

    /// Reload pending tasks from the store after a restart.
    ///
    /// Restored tasks whose `run_at` has passed fire on the next loop
    /// iteration; their pre-fire re-validation still applies, so consent
    /// that expired during downtime denies gated actions.
    #[tracing::instrument(skip(self))]
    pub async fn restore_pending(&self) -> VigilResult<usize> {
        let pending = self.inner.store.load_pending().await?;
        let mut restored = 0;

        {
            let mut arena = self.inner.arena.lock();
            for task in pending {
                if arena.contains_key(&task.id) {
                    continue;
                }
                let duplicate = arena.values().any(|candidate| {
                    candidate.idempotency_key == task.idempotency_key
                        && matches!(candidate.status, TaskStatus::Pending | TaskStatus::Firing)
                });
                if duplicate {
                    continue;
                }
                arena.insert(task.id, task);
                restored += 1;
            }
        }

        self.inner.notify.notify_waiters();
        tracing::info!(restored, "Restored pending tasks");
        self.inner
            .audit
            .record_event("scheduler", "tasks_restored", json!({"count": restored}))
            .await;
        Ok(restored)
    }

    /// Look up a task snapshot by id.
    pub fn task(&self, task_id: TaskId) -> Option<ScheduledTask> {
        self.inner.arena.lock().get(&task_id).cloned()
    }

    /// Number of tasks currently pending.
    pub fn pending_count(&self) -> usize {
        self.inner
            .arena
            .lock()
            .values()
            .filter(|task| task.status == TaskStatus::Pending)
            .count()
    }

    /// Spawn the timer loop.
    ///
    /// The loop sleeps until the next pending deadline, or until scheduling
    /// activity changes it, then claims and dispatches everything due.
    /// Abort the returned handle to stop the scheduler.
    pub fn spawn(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            loop {
                // Register for wakeups before reading the arena, so a
                // schedule/cancel racing with this check is never missed.
                let notified = scheduler.inner.notify.notified();
                match scheduler.next_pending_deadline() {
                    None => notified.await,
                    Some(at) => {
                        let wait = (at - Utc::now()).to_std().unwrap_or_default();
                        tokio::select! {
                            _ = notified => continue,
                            _ = tokio::time::sleep(wait) => scheduler.run_due_tasks().await,
                        }
                    }
                }
            }
        })
    }

    /// Claim and dispatch every task due now.
    ///
    /// Called by the timer loop; safe to call concurrently, since each task is
    /// claimed exactly once, so concurrent fire attempts on the same id
    /// produce a single completed/failed transition.
    pub async fn run_due_tasks(&self) {
        let now = Utc::now();
        let mut due: Vec<ScheduledTask> = {
            let mut arena = self.inner.arena.lock();
            arena
                .values_mut()
                .filter(|task| task.status == TaskStatus::Pending && task.run_at <= now)
                .map(|task| {
                    task.status = TaskStatus::Firing;
                    task.clone()
                })
                .collect()
        };
        due.sort_by_key(|task| task.run_at);

        for task in due {
            self.persist_update(&task).await;
            tracing::debug!(task_id = %task.id, "Task firing");
            let scheduler = self.clone();
            // Each action runs isolated from the loop's own progress.
            tokio::spawn(async move {
                scheduler.execute(task).await;
            });
        }
    }

    /// Execute one claimed task through gate check, registry lookup, and
    /// the action itself.
    async fn execute(&self, task: ScheduledTask) {
        let task_id = task.id;

        // Pre-fire re-validation: the gate is consulted now, not at
        // schedule time.
        if let Some(topic) = &task.action.gate_topic
            && !self.inner.gate.is_action_allowed(topic).await
        {
            let error = UnauthorizedActionError::new(topic.clone());
            tracing::warn!(%task_id, topic = %topic, "Consent denied at fire time");
            self.inner
                .audit
                .record_event(
                    "scheduler",
                    "task_denied",
                    json!({"task_id": task_id.to_string(), "topic": topic}),
                )
                .await;
            self.resolve(task_id, TaskStatus::Failed, Some(error.to_string()))
                .await;
            return;
        }

        let Some(action) = self.inner.registry.get(&task.action.action) else {
            let error = TaskError::new(TaskErrorKind::ActionNotRegistered(
                task.action.action.clone(),
            ));
            tracing::error!(%task_id, action = %task.action.action, "No such action registered");
            self.resolve(task_id, TaskStatus::Failed, Some(error.to_string()))
                .await;
            return;
        };

        match action.run(&task.action.args).await {
            Ok(()) => {
                tracing::info!(%task_id, "Task completed");
                self.inner
                    .audit
                    .record_event(
                        "scheduler",
                        "task_completed",
                        json!({"task_id": task_id.to_string()}),
                    )
                    .await;
                self.resolve(task_id, TaskStatus::Completed, None).await;
            }
            Err(e) => {
                let error = TaskError::new(TaskErrorKind::ActionFailed {
                    action: task.action.action.clone(),
                    reason: e.to_string(),
                });
                tracing::error!(%task_id, error = %e, "Task action failed");
                self.inner
                    .audit
                    .record_event(
                        "scheduler",
                        "task_failed",
                        json!({"task_id": task_id.to_string(), "error": e.to_string()}),
                    )
                    .await;
                // Never retried automatically: one-shot means one delivery.
                self.resolve(task_id, TaskStatus::Failed, Some(error.to_string()))
                    .await;
            }
        }
    }

    /// Move a firing task to its terminal status.
    async fn resolve(&self, task_id: TaskId, status: TaskStatus, error: Option<String>) {
        let resolved = {
            let mut arena = self.inner.arena.lock();
            match arena.get_mut(&task_id) {
                Some(task) if task.status == TaskStatus::Firing => {
                    task.status = status;
                    task.error = error;
                    Some(task.clone())
                }
                _ => None,
            }
        };
        if let Some(task) = resolved {
            self.persist_update(&task).await;
        }
    }

    /// Best-effort status persistence; a lagging durable status must not
    /// block the in-memory transition that already happened.
    async fn persist_update(&self, task: &ScheduledTask) {
        if let Err(e) = self.inner.store.update(task).await {
            tracing::warn!(task_id = %task.id, error = %e, "Failed to persist task update");
        }
    }

    fn next_pending_deadline(&self) -> Option<DateTime<Utc>> {
        self.inner
            .arena
            .lock()
            .values()
            .filter(|task| task.status == TaskStatus::Pending)
            .map(|task| task.run_at)
            .min()
    }
}

#[async_trait::async_trait]
impl PendingTaskCanceler for TaskScheduler {
    async fn cancel_all(&self) -> usize {
        self.cancel_all_pending().await
    }
}
