//! Answers role assignments from the leader.

use std::sync::Arc;
use std::time::Duration;

use pluginfleet_core::{RoleAck, RoleAssignment};
use pluginfleet_fabric::{keys, publish_json, Broker, Delivery};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::WorkerError;

/// Pause before handing an assignment meant for another agent back to the
/// queue.
const REQUEUE_DELAY: Duration = Duration::from_millis(200);

/// Assignments for another agent older than this are dropped. Twice the
/// leader's default acknowledgement timeout.
const ASSIGNMENT_TTL: Duration = Duration::from_secs(60);

/// Consumes role assignments and replies with an acceptance.
pub struct RoleResponder {
    broker: Arc<dyn Broker>,
    agent_name: String,
    queue: String,
}

impl RoleResponder {
    pub fn new(broker: Arc<dyn Broker>, agent_name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            broker,
            agent_name: agent_name.into(),
            queue: queue.into(),
        }
    }

    pub async fn run(&self) -> Result<(), WorkerError> {
        let mut deliveries = self.broker.consume(&self.queue, 1).await?;
        info!(agent = %self.agent_name, queue = %self.queue, "Listening for role assignments");

        while let Some(delivery) = deliveries.next().await {
            self.respond(delivery?).await?;
        }
        Ok(())
    }

    /// Accept an assignment addressed to this agent (or to nobody). Others
    /// go back on the queue for their addressee until they expire.
    pub async fn respond(&self, delivery: Delivery) -> Result<(), WorkerError> {
        let assignment: RoleAssignment = match delivery.decode() {
            Ok(assignment) => assignment,
            Err(e) => {
                warn!(error = %e, "Malformed role assignment discarded");
                delivery.ack().await?;
                return Ok(());
            }
        };

        if !assignment.is_for(&self.agent_name) {
            if assignment.is_older_than(ASSIGNMENT_TTL) {
                warn!(
                    target_agent = %assignment.agent,
                    role = %assignment.role,
                    "Unclaimed role assignment expired"
                );
                delivery.ack().await?;
                return Ok(());
            }
            debug!(target_agent = %assignment.agent, "Assignment for another agent");
            tokio::time::sleep(REQUEUE_DELAY).await;
            delivery.reject(true).await?;
            return Ok(());
        }

        info!(
            role = %assignment.role,
            assigned_by = %assignment.assigned_by,
            "Role accepted"
        );
        let ack = RoleAck::accepted(&self.agent_name, &assignment.role);
        publish_json(self.broker.as_ref(), keys::ROLE_ACK, &ack).await?;
        delivery.ack().await?;
        Ok(())
    }
}
