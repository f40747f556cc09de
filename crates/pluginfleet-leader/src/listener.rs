//! Result and heartbeat consumer.
//!
//! Runs on its own broker connection so a slow consume never holds up task
//! publishing. Decoded messages are forwarded to the reconciler; the
//! delivery is acked once the reconciler has accepted it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use pluginfleet_core::{Heartbeat, ResultMessage};
use pluginfleet_fabric::{Broker, Delivery, FabricError};

/// A decoded message for the reconciler.
#[derive(Debug, Clone)]
pub enum Inbound {
    Result(ResultMessage),
    Heartbeat(Heartbeat),
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Results,
    Heartbeats,
}

/// Consumes the shared result queue and the heartbeat queue.
pub struct ResultListener {
    broker: Arc<dyn Broker>,
    result_queue: String,
    heartbeat_queue: String,
    tx: mpsc::Sender<Inbound>,
}

impl ResultListener {
    pub fn new(
        broker: Arc<dyn Broker>,
        result_queue: impl Into<String>,
        heartbeat_queue: impl Into<String>,
        tx: mpsc::Sender<Inbound>,
    ) -> Self {
        Self {
            broker,
            result_queue: result_queue.into(),
            heartbeat_queue: heartbeat_queue.into(),
            tx,
        }
    }

    /// Forward until both streams end, the broker fails or the reconciler
    /// goes away.
    pub async fn run(self) -> Result<(), FabricError> {
        let results = self
            .broker
            .consume(&self.result_queue, 0)
            .await?
            .map(|delivery| (Source::Results, delivery));
        let heartbeats = self
            .broker
            .consume(&self.heartbeat_queue, 0)
            .await?
            .map(|delivery| (Source::Heartbeats, delivery));

        info!(
            result_queue = %self.result_queue,
            heartbeat_queue = %self.heartbeat_queue,
            "Result listener started"
        );

        let mut inbound = results.merge(heartbeats);
        while let Some((source, delivery)) = inbound.next().await {
            let delivery = delivery?;
            let Some(message) = decode(source, &delivery) else {
                delivery.ack().await?;
                continue;
            };

            if self.tx.send(message).await.is_err() {
                // Unacked, so the broker redelivers it to the next leader.
                debug!("Reconciler closed, stopping listener");
                return Ok(());
            }
            delivery.ack().await?;
        }

        info!("Result listener stopped");
        Ok(())
    }
}

fn decode(source: Source, delivery: &Delivery) -> Option<Inbound> {
    let decoded = match source {
        Source::Results => delivery.decode().map(Inbound::Result),
        Source::Heartbeats => delivery.decode().map(Inbound::Heartbeat),
    };
    match decoded {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(
                routing_key = %delivery.routing_key,
                error = %e,
                "Malformed message discarded"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pluginfleet_core::{ResultStatus, Role, TaskId, WorkerId};
    use pluginfleet_fabric::{keys, publish_json, MemoryBroker, Topology};
    use serde_json::json;

    #[tokio::test]
    async fn test_forwards_results_and_heartbeats() {
        let broker = MemoryBroker::new();
        let topology = Topology::default();
        broker.declare(&topology).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let listener = ResultListener::new(
            Arc::new(broker.clone()),
            topology.result_queue.clone(),
            topology.heartbeat_queue.clone(),
            tx,
        );
        tokio::spawn(listener.run());

        let result = ResultMessage::new(
            TaskId::new("task-9"),
            Role::Lifecycle.display_name(),
            WorkerId::new("lifecycle-001"),
            ResultStatus::Success,
            json!({"status": "HEALTHY"}),
            Duration::from_millis(4),
        );
        publish_json(&broker, &keys::result(Role::Lifecycle), &result)
            .await
            .unwrap();
        publish_json(
            &broker,
            &keys::heartbeat(Role::Manifest),
            &Heartbeat::alive(Role::Manifest, WorkerId::new("manifest-001"), 0),
        )
        .await
        .unwrap();

        let mut seen_result = false;
        let mut seen_heartbeat = false;
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                Inbound::Result(r) => seen_result = r.task_id == TaskId::new("task-9"),
                Inbound::Heartbeat(h) => seen_heartbeat = h.worker == Role::Manifest,
            }
        }
        assert!(seen_result);
        assert!(seen_heartbeat);
    }

    #[tokio::test]
    async fn test_malformed_result_is_acked_and_skipped() {
        let broker = MemoryBroker::new();
        let topology = Topology::default();
        broker.declare(&topology).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let listener = ResultListener::new(
            Arc::new(broker.clone()),
            topology.result_queue.clone(),
            topology.heartbeat_queue.clone(),
            tx,
        );
        tokio::spawn(listener.run());

        broker
            .publish(&keys::result(Role::Manifest), b"{not json")
            .await
            .unwrap();
        let valid = ResultMessage::new(
            TaskId::new("task-10"),
            Role::Manifest.display_name(),
            WorkerId::new("manifest-001"),
            ResultStatus::Failed,
            json!({"error": "boom"}),
            Duration::from_millis(1),
        );
        publish_json(&broker, &keys::result(Role::Manifest), &valid)
            .await
            .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(next, Inbound::Result(r) if r.task_id == TaskId::new("task-10")));
        assert_eq!(broker.queue_depth("results.guardian"), Some(0));
    }
}
