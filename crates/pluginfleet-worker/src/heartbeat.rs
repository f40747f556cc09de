//! Periodic liveness announcements.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pluginfleet_core::Heartbeat;
use pluginfleet_fabric::{keys, publish_json, Broker};
use tracing::{debug, warn};

use crate::WorkerConfig;

/// Publish a heartbeat to `heartbeat.<role>` every interval, forever.
pub async fn run_heartbeat_loop(
    broker: Arc<dyn Broker>,
    config: Arc<WorkerConfig>,
    tasks_processed: Arc<AtomicU64>,
) {
    let routing_key = keys::heartbeat(config.role);
    let mut interval_timer = tokio::time::interval(config.heartbeat_interval);

    loop {
        interval_timer.tick().await;

        let heartbeat = Heartbeat::alive(
            config.role,
            config.worker_id.clone(),
            tasks_processed.load(Ordering::SeqCst),
        );

        match publish_json(broker.as_ref(), &routing_key, &heartbeat).await {
            Ok(()) => debug!(tasks_processed = heartbeat.tasks_processed, "Heartbeat sent"),
            Err(e) => warn!(error = %e, "Failed to send heartbeat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginfleet_core::Role;
    use pluginfleet_fabric::{MemoryBroker, Topology};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_carry_task_count() {
        let broker = MemoryBroker::new();
        let topology = Topology::default();
        broker.declare(&topology).await.unwrap();

        let mut config = WorkerConfig::new(Role::Lifecycle);
        config.heartbeat_interval = Duration::from_secs(10);
        let counter = Arc::new(AtomicU64::new(4));

        let handle = tokio::spawn(run_heartbeat_loop(
            Arc::new(broker.clone()),
            Arc::new(config),
            counter,
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.abort();

        assert_eq!(broker.queue_depth(&topology.heartbeat_queue), Some(3));
        let first: Heartbeat = broker
            .get(&topology.heartbeat_queue)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(first.worker, Role::Lifecycle);
        assert_eq!(first.tasks_processed, 4);
        assert_eq!(first.status, "alive");
    }
}
