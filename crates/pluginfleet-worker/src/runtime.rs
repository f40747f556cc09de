//! The task consume loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pluginfleet_core::{Command, ResultMessage, ResultStatus, TaskMessage, WorkerState};
use pluginfleet_fabric::{keys, publish_json, Broker, Delivery};
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::handlers::{dispatch, Outcome};
use crate::{WorkerConfig, WorkerError};

/// Consumes one role's task queue and answers every task with a result.
pub struct WorkerRuntime {
    broker: Arc<dyn Broker>,
    config: Arc<WorkerConfig>,
    queue: String,
    state: WorkerState,
    tasks_processed: Arc<AtomicU64>,
}

impl WorkerRuntime {
    /// Create a runtime reading from `queue`.
    pub fn new(broker: Arc<dyn Broker>, config: Arc<WorkerConfig>, queue: impl Into<String>) -> Self {
        Self {
            broker,
            config,
            queue: queue.into(),
            state: WorkerState::Idle,
            tasks_processed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter shared with the heartbeat loop.
    pub fn tasks_processed(&self) -> Arc<AtomicU64> {
        self.tasks_processed.clone()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Consume until the delivery stream ends or the broker fails.
    pub async fn run(&mut self) -> Result<(), WorkerError> {
        let mut deliveries = self
            .broker
            .consume(&self.queue, self.config.prefetch)
            .await?;

        info!(
            role = %self.config.role,
            worker_id = %self.config.worker_id,
            queue = %self.queue,
            "Waiting for tasks"
        );

        while let Some(delivery) = deliveries.next().await {
            self.process(delivery?).await?;
        }

        info!(
            tasks_processed = self.tasks_processed.load(Ordering::SeqCst),
            "Task stream closed"
        );
        Ok(())
    }

    /// Handle one delivery: decode, execute, publish the result, then ack.
    pub async fn process(&mut self, delivery: Delivery) -> Result<(), WorkerError> {
        let started = Instant::now();

        let task: TaskMessage = match delivery.decode() {
            Ok(task) => task,
            Err(e) => {
                warn!(routing_key = %delivery.routing_key, error = %e, "Malformed task discarded");
                delivery.ack().await?;
                return Ok(());
            }
        };

        self.state = self.state.transition(WorkerState::Received)?;
        info!(task_id = %task.task_id, command = %task.command, from = %task.from, "Task received");

        self.state = self.state.transition(WorkerState::Processing)?;
        let outcome = self.execute(&task).await;

        self.state = self.state.transition(match outcome.status {
            ResultStatus::Success => WorkerState::Succeeded,
            ResultStatus::Failed => WorkerState::Failed,
        })?;

        let result = ResultMessage::new(
            task.task_id,
            self.config.role.display_name(),
            self.config.worker_id.clone(),
            outcome.status,
            outcome.result,
            started.elapsed(),
        );
        publish_json(self.broker.as_ref(), &keys::result(self.config.role), &result).await?;
        delivery.ack().await?;

        let processed = self.tasks_processed.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            task_id = %result.task_id,
            status = %result.status,
            execution_time_ms = result.execution_time_ms,
            tasks_processed = processed,
            "Task completed"
        );

        self.state = self.state.transition(WorkerState::Idle)?;
        Ok(())
    }

    async fn execute(&self, task: &TaskMessage) -> Outcome {
        let command = match Command::parse(self.config.role, &task.command, &task.params) {
            Ok(command) => command,
            Err(e) => {
                warn!(task_id = %task.task_id, error = %e, "Rejected command");
                return Outcome::failed(&e);
            }
        };

        match dispatch(command, &self.config.marketplace_root).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(task_id = %task.task_id, error = %e, "Handler failed");
                Outcome::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginfleet_core::{LifecycleCommand, ManifestCommand, Params, Role, ValidationKind};
    use pluginfleet_fabric::{MemoryBroker, Topology};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    struct Harness {
        broker: MemoryBroker,
        topology: Topology,
        runtime: WorkerRuntime,
    }

    async fn harness(role: Role, root: &std::path::Path) -> Harness {
        let broker = MemoryBroker::new();
        let topology = Topology::default();
        broker.declare(&topology).await.unwrap();
        let config = Arc::new(WorkerConfig::new(role).with_marketplace_root(root));
        let runtime = WorkerRuntime::new(
            Arc::new(broker.clone()),
            config,
            topology.task_queue(role),
        );
        Harness {
            broker,
            topology,
            runtime,
        }
    }

    impl Harness {
        async fn process_next(&mut self) {
            let queue = self.runtime.queue.clone();
            let delivery = self.broker.get(&queue).await.unwrap().unwrap();
            self.runtime.process(delivery).await.unwrap();
        }

        async fn take_result(&self) -> ResultMessage {
            let delivery = self
                .broker
                .get(&self.topology.result_queue)
                .await
                .unwrap()
                .expect("a result was published");
            delivery.ack().await.unwrap();
            delivery.decode().unwrap()
        }
    }

    #[tokio::test]
    async fn test_task_yields_one_correlated_result() {
        let root = tempdir().unwrap();
        let mut h = harness(Role::Manifest, root.path()).await;

        let task = TaskMessage::new(
            &Command::Manifest(ManifestCommand::Validate {
                kind: ValidationKind::Plugin,
                path: "absent".into(),
            }),
            "tester",
        );
        publish_json(&h.broker, &keys::task(Role::Manifest), &task)
            .await
            .unwrap();

        h.process_next().await;

        let result = h.take_result().await;
        assert_eq!(result.task_id, task.task_id);
        assert_eq!(result.worker, "Plugin Manifest Agent");
        assert_eq!(result.worker_id.as_str(), "manifest-001");
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(h.runtime.state(), WorkerState::Idle);
        assert_eq!(h.runtime.tasks_processed().load(Ordering::SeqCst), 1);
        assert_eq!(h.broker.queue_depth(&h.topology.result_queue), Some(0));
        assert_eq!(h.broker.queue_depth(h.topology.task_queue(Role::Manifest)), Some(0));
    }

    #[tokio::test]
    async fn test_unknown_command_fails_with_error_payload() {
        let root = tempdir().unwrap();
        let mut h = harness(Role::Lifecycle, root.path()).await;

        let mut task = TaskMessage::new(
            &Command::Lifecycle(LifecycleCommand::Health {
                plugin: "p".into(),
            }),
            "tester",
        );
        task.command = "frobnicate".to_string();
        task.params = Params::new();
        publish_json(&h.broker, &keys::task(Role::Lifecycle), &task)
            .await
            .unwrap();

        h.process_next().await;

        let result = h.take_result().await;
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(result.result, json!({"error": "Unknown command: frobnicate"}));
    }

    #[tokio::test]
    async fn test_missing_parameter_fails() {
        let root = tempdir().unwrap();
        let mut h = harness(Role::Manifest, root.path()).await;

        let mut task = TaskMessage::new(
            &Command::Manifest(ManifestCommand::CheckStructure { path: "p".into() }),
            "tester",
        );
        task.params = Params::new();
        publish_json(&h.broker, &keys::task(Role::Manifest), &task)
            .await
            .unwrap();

        h.process_next().await;

        let result = h.take_result().await;
        assert_eq!(result.status, ResultStatus::Failed);
        assert!(result.result["error"].as_str().unwrap().contains("path"));
    }

    #[tokio::test]
    async fn test_malformed_task_is_discarded() {
        let root = tempdir().unwrap();
        let mut h = harness(Role::Manifest, root.path()).await;
        h.broker
            .publish(&keys::task(Role::Manifest), b"not json")
            .await
            .unwrap();

        h.process_next().await;

        assert_eq!(h.broker.queue_depth(h.topology.task_queue(Role::Manifest)), Some(0));
        assert_eq!(h.broker.queue_depth(&h.topology.result_queue), Some(0));
        assert_eq!(h.runtime.state(), WorkerState::Idle);
    }

    #[tokio::test]
    async fn test_run_processes_queue_in_order() {
        let root = tempdir().unwrap();
        let plugin = root.path().join("ok");
        fs::create_dir_all(plugin.join(".claude-plugin")).unwrap();
        fs::write(plugin.join(".claude-plugin/plugin.json"), r#"{"name": "ok"}"#).unwrap();

        let h = harness(Role::Manifest, root.path()).await;
        let Harness {
            broker,
            topology,
            mut runtime,
        } = h;

        let mut sent = Vec::new();
        for path in ["ok", "missing"] {
            let task = TaskMessage::new(
                &Command::Manifest(ManifestCommand::Validate {
                    kind: ValidationKind::Plugin,
                    path: path.into(),
                }),
                "tester",
            );
            publish_json(&broker, &keys::task(Role::Manifest), &task)
                .await
                .unwrap();
            sent.push(task.task_id);
        }

        let worker = tokio::spawn(async move { runtime.run().await });

        let mut results = Vec::new();
        while results.len() < 2 {
            if let Some(delivery) = broker.get(&topology.result_queue).await.unwrap() {
                delivery.ack().await.unwrap();
                results.push(delivery.decode::<ResultMessage>().unwrap());
            } else {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        }
        worker.abort();

        let ids: Vec<_> = results.iter().map(|r| r.task_id.clone()).collect();
        assert_eq!(ids, sent);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
    }
}
