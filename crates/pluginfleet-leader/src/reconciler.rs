//! Owns every transition out of the pending table.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use pluginfleet_core::ResultMessage;

use crate::{Correlation, Inbound, LeaderConfig, LeaderState, Review};

/// Applies inbound results and heartbeats to the leader state and expires
/// overdue tasks.
pub struct Reconciler {
    state: Arc<LeaderState>,
    config: Arc<LeaderConfig>,
    rx: mpsc::Receiver<Inbound>,
}

impl Reconciler {
    pub fn new(state: Arc<LeaderState>, config: Arc<LeaderConfig>, rx: mpsc::Receiver<Inbound>) -> Self {
        Self { state, config, rx }
    }

    /// Run until every sender is gone.
    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.config.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                inbound = self.rx.recv() => match inbound {
                    Some(inbound) => self.apply(inbound).await,
                    None => break,
                },
                _ = sweep.tick() => self.sweep().await,
            }
        }

        debug!("Reconciler stopped");
    }

    /// Apply one inbound message.
    pub async fn apply(&self, inbound: Inbound) {
        match inbound {
            Inbound::Result(result) => {
                let review = self.record(result).await;
                println!("\n{}", review);
            }
            Inbound::Heartbeat(heartbeat) => {
                debug!(
                    worker = %heartbeat.worker,
                    worker_id = %heartbeat.worker_id,
                    tasks_processed = heartbeat.tasks_processed,
                    "Heartbeat"
                );
                self.state.record_heartbeat(heartbeat).await;
            }
        }
    }

    async fn record(&self, result: ResultMessage) -> Review {
        let task_id = result.task_id.clone();
        let status = result.status;
        let review_source = result.clone();
        let correlation = self.state.resolve(result).await;

        match correlation {
            Correlation::Matched => {
                info!(task_id = %task_id, status = %status, "Result received");
            }
            Correlation::Stray => {
                info!(task_id = %task_id, status = %status, "Result for unknown task recorded");
            }
            Correlation::Late => {
                warn!(task_id = %task_id, status = %status, "Result arrived after timeout");
            }
        }

        Review::of(&review_source, correlation)
    }

    /// Time out every task whose deadline has passed and drop records past
    /// their retention.
    pub async fn sweep(&self) {
        if let Ok(retention) = chrono::Duration::from_std(self.config.result_retention) {
            let pruned = self.state.prune_results(Utc::now() - retention).await;
            if pruned > 0 {
                debug!(pruned, "Old task records dropped");
            }
        }

        for expired in self.state.expire(Instant::now()).await {
            warn!(
                task_id = %expired.task.task_id,
                command = %expired.task.command,
                role = %expired.task.assigned_worker,
                "Task timed out"
            );
            println!(
                "\n[TIMEOUT] Task {} ({} -> {}) got no result",
                expired.task.task_id, expired.task.command, expired.task.assigned_worker
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pluginfleet_core::{
        Command, Heartbeat, LifecycleCommand, ResultStatus, Role, TaskId, TaskMessage,
        TaskOutcome, WorkerId, LEADER_ID,
    };
    use serde_json::json;

    fn health_task() -> TaskMessage {
        TaskMessage::new(
            &Command::Lifecycle(LifecycleCommand::Health {
                plugin: "demo-plugin".to_string(),
            }),
            LEADER_ID,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_times_out_overdue_task() {
        let state = LeaderState::new();
        let config = Arc::new(LeaderConfig {
            task_deadline: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
            ..LeaderConfig::default()
        });
        let (tx, rx) = mpsc::channel(4);
        let reconciler = Reconciler::new(state.clone(), config.clone(), rx);
        let handle = tokio::spawn(reconciler.run());

        let task = health_task();
        let id = task.task_id.clone();
        state
            .insert_pending(task, Instant::now() + config.task_deadline)
            .await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(state.is_pending(&id).await);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(!state.is_pending(&id).await);
        assert_eq!(state.record(&id).await.unwrap().outcome, TaskOutcome::TimedOut);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_drops_records_past_retention() {
        let state = LeaderState::new();
        let config = Arc::new(LeaderConfig {
            result_retention: Duration::ZERO,
            ..LeaderConfig::default()
        });
        let (_tx, rx) = mpsc::channel(4);
        let reconciler = Reconciler::new(state.clone(), config, rx);

        let id = TaskId::new("finished");
        state
            .resolve(ResultMessage::new(
                id.clone(),
                Role::Lifecycle.display_name(),
                WorkerId::new("lifecycle-001"),
                ResultStatus::Success,
                json!({}),
                Duration::from_millis(1),
            ))
            .await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        reconciler.sweep().await;

        assert!(state.record(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_apply_records_result_and_heartbeat() {
        let state = LeaderState::new();
        let (_tx, rx) = mpsc::channel(4);
        let reconciler = Reconciler::new(state.clone(), Arc::new(LeaderConfig::default()), rx);

        let task = health_task();
        let id = task.task_id.clone();
        state
            .insert_pending(task, Instant::now() + Duration::from_secs(60))
            .await;

        reconciler
            .apply(Inbound::Result(ResultMessage::new(
                id.clone(),
                Role::Lifecycle.display_name(),
                WorkerId::new("lifecycle-001"),
                ResultStatus::Success,
                json!({"status": "HEALTHY"}),
                Duration::from_millis(2),
            )))
            .await;
        reconciler
            .apply(Inbound::Heartbeat(Heartbeat::alive(
                Role::Lifecycle,
                WorkerId::new("lifecycle-001"),
                1,
            )))
            .await;

        assert_eq!(state.pending_count().await, 0);
        let record = state.record(&id).await.unwrap();
        assert_eq!(record.outcome, TaskOutcome::Succeeded);
        assert_eq!(record.correlation, Correlation::Matched);
        assert_eq!(state.workers().await.len(), 1);
    }
}
