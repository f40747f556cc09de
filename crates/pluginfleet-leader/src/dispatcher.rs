//! Publishing side of the leader: tasks, broadcasts and role assignments.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use pluginfleet_core::{BroadcastMessage, Command, RoleAck, RoleAssignment, TaskId, TaskMessage};
use pluginfleet_fabric::{keys, publish_json, request_reply, Broker, FabricError, ReplyWait};

use crate::{LeaderConfig, LeaderState};

/// Publishes on the leader's command connection.
pub struct Dispatcher {
    broker: Arc<dyn Broker>,
    state: Arc<LeaderState>,
    config: Arc<LeaderConfig>,
    role_ack_queue: String,
}

impl Dispatcher {
    pub fn new(
        broker: Arc<dyn Broker>,
        state: Arc<LeaderState>,
        config: Arc<LeaderConfig>,
        role_ack_queue: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            state,
            config,
            role_ack_queue: role_ack_queue.into(),
        }
    }

    /// Publish `command` to its role's task queue and return the new task id
    /// without waiting for the result.
    ///
    /// The task is tracked as pending before it is published, so a result
    /// cannot overtake its own pending entry.
    pub async fn send_task(&self, command: Command) -> Result<TaskId, FabricError> {
        let task = TaskMessage::new(&command, &self.config.leader_id);
        let task_id = task.task_id.clone();
        let routing_key = keys::task(command.role());

        let deadline = Instant::now() + self.config.task_deadline;
        self.state.insert_pending(task.clone(), deadline).await;

        if let Err(e) = publish_json(self.broker.as_ref(), &routing_key, &task).await {
            self.state.remove_pending(&task_id).await;
            warn!(task_id = %task_id, error = %e, "Task publish failed");
            return Err(e);
        }

        info!(
            task_id = %task_id,
            command = %command,
            routing_key = %routing_key,
            "Task sent"
        );
        Ok(task_id)
    }

    /// Publish a best-effort notice to every broadcast listener.
    pub async fn broadcast(&self, message: &str) -> Result<(), FabricError> {
        let notice = BroadcastMessage::new(message, &self.config.leader_id);
        publish_json(self.broker.as_ref(), keys::BROADCAST, &notice).await?;
        debug!(notice = %message, "Broadcast sent");
        Ok(())
    }

    /// Offer `role` to `agent` and wait for its acknowledgement.
    pub async fn assign_role(&self, role: &str, agent: &str) -> Result<RoleAck, FabricError> {
        let assignment = RoleAssignment::new(role, agent, &self.config.leader_id);
        let wait = ReplyWait::new(&self.role_ack_queue)
            .with_timeout(self.config.role_ack_timeout)
            .with_poll_interval(self.config.role_ack_poll_interval);

        info!(role, agent, "Assigning role");
        let ack: RoleAck = request_reply(self.broker.as_ref(), keys::ROLE_ASSIGN, &assignment, &wait).await?;
        info!(agent = %ack.agent, role = %ack.role, status = %ack.status, "Role acknowledged");
        Ok(ack)
    }
}
