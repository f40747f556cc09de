//! Shared leader state.
//!
//! The session inserts pending tasks and reads both tables; the reconciler
//! is the only writer that moves a task from `pending` to `results`. Both
//! tables are locked in the same order (`pending`, then `results`) so a
//! reader never sees a task in neither table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use pluginfleet_core::{Heartbeat, ResultMessage, Role, TaskId, TaskMessage, TaskOutcome, WorkerId};

/// A task published and still waiting for its result.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub task: TaskMessage,

    /// Wall-clock time the task was sent.
    pub sent_at: DateTime<Utc>,

    /// The task times out once this instant has passed.
    pub deadline: Instant,
}

/// How an inbound result related to the pending table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// The result answered a pending task.
    Matched,
    /// No task with this id was ever pending here.
    Stray,
    /// The task had already timed out.
    Late,
}

impl Correlation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Correlation::Matched => "matched",
            Correlation::Stray => "stray",
            Correlation::Late => "late",
        }
    }
}

/// Terminal record of a task.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub outcome: TaskOutcome,

    /// The result message; `None` for a task that timed out.
    pub result: Option<ResultMessage>,

    pub correlation: Correlation,

    pub recorded_at: DateTime<Utc>,
}

/// Last heartbeat seen from a role.
#[derive(Debug, Clone)]
pub struct WorkerSighting {
    pub worker_id: WorkerId,
    pub status: String,
    pub tasks_processed: u64,
    pub last_seen: DateTime<Utc>,
}

impl From<Heartbeat> for WorkerSighting {
    fn from(heartbeat: Heartbeat) -> Self {
        Self {
            worker_id: heartbeat.worker_id,
            status: heartbeat.status,
            tasks_processed: heartbeat.tasks_processed,
            last_seen: heartbeat.timestamp,
        }
    }
}

/// Pending tasks, terminal records and worker sightings.
pub struct LeaderState {
    /// Tasks awaiting a result, indexed by TaskId.
    pub pending: RwLock<HashMap<TaskId, PendingTask>>,

    /// Terminal records indexed by TaskId.
    pub results: RwLock<HashMap<TaskId, TaskRecord>>,

    /// Last heartbeat per role.
    pub workers: RwLock<BTreeMap<Role, WorkerSighting>>,
}

impl LeaderState {
    /// Create a new LeaderState wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
            workers: RwLock::new(BTreeMap::new()),
        })
    }

    /// Track `task` until its result arrives or `deadline` passes.
    pub async fn insert_pending(&self, task: TaskMessage, deadline: Instant) {
        let entry = PendingTask {
            sent_at: task.timestamp,
            task,
            deadline,
        };
        self.pending
            .write()
            .await
            .insert(entry.task.task_id.clone(), entry);
    }

    /// Forget a pending task that was never published.
    pub async fn remove_pending(&self, task_id: &TaskId) -> Option<PendingTask> {
        self.pending.write().await.remove(task_id)
    }

    /// Record an inbound result, removing its pending entry if there is one.
    ///
    /// Always records the result; the returned correlation says whether it
    /// was expected.
    pub async fn resolve(&self, result: ResultMessage) -> Correlation {
        let mut pending = self.pending.write().await;
        let mut results = self.results.write().await;

        let correlation = if pending.remove(&result.task_id).is_some() {
            Correlation::Matched
        } else {
            match results.get(&result.task_id) {
                Some(record) if record.outcome == TaskOutcome::TimedOut => Correlation::Late,
                _ => Correlation::Stray,
            }
        };

        let task_id = result.task_id.clone();
        let record = TaskRecord {
            outcome: result.status.into(),
            result: Some(result),
            correlation,
            recorded_at: Utc::now(),
        };
        results.insert(task_id, record);
        correlation
    }

    /// Move every pending task whose deadline is at or before `now` into the
    /// results table as timed out. Returns the expired tasks.
    pub async fn expire(&self, now: Instant) -> Vec<PendingTask> {
        let mut pending = self.pending.write().await;
        let mut results = self.results.write().await;

        let expired_ids: Vec<TaskId> = pending
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();

        let mut expired = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            if let Some(entry) = pending.remove(&id) {
                results.insert(
                    id,
                    TaskRecord {
                        outcome: TaskOutcome::TimedOut,
                        result: None,
                        correlation: Correlation::Matched,
                        recorded_at: Utc::now(),
                    },
                );
                expired.push(entry);
            }
        }
        expired.sort_by_key(|entry| entry.sent_at);
        expired
    }

    /// Drop terminal records recorded before `cutoff`. Returns how many.
    pub async fn prune_results(&self, cutoff: DateTime<Utc>) -> usize {
        let mut results = self.results.write().await;
        let before = results.len();
        results.retain(|_, record| record.recorded_at >= cutoff);
        before - results.len()
    }

    /// Remember the latest heartbeat of its role.
    pub async fn record_heartbeat(&self, heartbeat: Heartbeat) {
        let role = heartbeat.worker;
        self.workers.write().await.insert(role, heartbeat.into());
    }

    /// Get the number of pending tasks.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Get the number of terminal records.
    pub async fn result_count(&self) -> usize {
        self.results.read().await.len()
    }

    /// Pending tasks, oldest first.
    pub async fn pending_tasks(&self) -> Vec<PendingTask> {
        let mut tasks: Vec<PendingTask> = self.pending.read().await.values().cloned().collect();
        tasks.sort_by_key(|entry| entry.sent_at);
        tasks
    }

    /// Terminal record of `task_id`, if any.
    pub async fn record(&self, task_id: &TaskId) -> Option<TaskRecord> {
        self.results.read().await.get(task_id).cloned()
    }

    /// Whether `task_id` is still pending.
    pub async fn is_pending(&self, task_id: &TaskId) -> bool {
        self.pending.read().await.contains_key(task_id)
    }

    /// Latest sighting per role.
    pub async fn workers(&self) -> Vec<(Role, WorkerSighting)> {
        self.workers
            .read()
            .await
            .iter()
            .map(|(role, sighting)| (*role, sighting.clone()))
            .collect()
    }
}
