//! Leader configuration.

use std::time::Duration;

use pluginfleet_core::LEADER_ID;

/// Leader configuration.
#[derive(Debug, Clone)]
pub struct LeaderConfig {
    /// Sender name stamped on tasks, broadcasts and role assignments.
    pub leader_id: String,

    /// How long a task may wait for its result before it times out.
    pub task_deadline: Duration,

    /// How often pending tasks are checked against their deadline.
    pub sweep_interval: Duration,

    /// How long `assign` waits for an acknowledgement.
    pub role_ack_timeout: Duration,

    /// Poll interval while waiting for an acknowledgement.
    pub role_ack_poll_interval: Duration,

    /// How long terminal records are kept before the sweep drops them.
    pub result_retention: Duration,

    /// Capacity of the listener-to-reconciler channel.
    pub inbound_capacity: usize,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            leader_id: LEADER_ID.to_string(),
            task_deadline: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(5),
            role_ack_timeout: Duration::from_secs(30),
            role_ack_poll_interval: Duration::from_millis(500),
            result_retention: Duration::from_secs(3600),
            inbound_capacity: 256,
        }
    }
}
