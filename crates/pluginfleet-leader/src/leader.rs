//! Wires the publisher, the listener and the reconciler together.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use pluginfleet_fabric::{Broker, Topology};

use crate::{Dispatcher, LeaderConfig, LeaderState, Reconciler, ResultListener, Session};

/// A running leader.
///
/// `publisher` carries tasks, broadcasts and role assignments;
/// `listener_broker` should be a separate connection used only for
/// consuming results and heartbeats.
pub struct Leader {
    state: Arc<LeaderState>,
    session: Session,
    listener: JoinHandle<()>,
    reconciler: JoinHandle<()>,
}

impl Leader {
    pub fn spawn(
        publisher: Arc<dyn Broker>,
        listener_broker: Arc<dyn Broker>,
        topology: Topology,
        config: LeaderConfig,
    ) -> Self {
        let config = Arc::new(config);
        let state = LeaderState::new();
        let (tx, rx) = mpsc::channel(config.inbound_capacity);

        let listener = ResultListener::new(
            listener_broker,
            topology.result_queue.clone(),
            topology.heartbeat_queue.clone(),
            tx,
        );
        let listener = tokio::spawn(async move {
            if let Err(e) = listener.run().await {
                error!(error = %e, "Result listener failed");
            }
        });

        let reconciler = tokio::spawn(Reconciler::new(state.clone(), config.clone(), rx).run());

        let dispatcher = Dispatcher::new(
            publisher,
            state.clone(),
            config.clone(),
            topology.role_ack_queue.clone(),
        );
        let session = Session::new(dispatcher, state.clone(), topology);

        info!(leader_id = %config.leader_id, "Leader started");
        Self {
            state,
            session,
            listener,
            reconciler,
        }
    }

    pub fn state(&self) -> Arc<LeaderState> {
        self.state.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stop consuming. In-flight deliveries that were not acked are
    /// redelivered by the broker.
    pub async fn shutdown(self) {
        self.listener.abort();
        self.reconciler.abort();
        let _ = self.listener.await;
        let _ = self.reconciler.await;
        info!("Leader stopped");
    }
}
