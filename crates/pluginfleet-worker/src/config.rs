//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use pluginfleet_core::{Role, WorkerId};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Role served by this worker.
    pub role: Role,

    /// Worker ID reported in results and heartbeats.
    pub worker_id: WorkerId,

    /// Relative plugin paths are resolved against this directory.
    pub marketplace_root: PathBuf,

    /// Unacknowledged task deliveries allowed at once.
    pub prefetch: u16,

    /// Heartbeat interval.
    pub heartbeat_interval: Duration,

    /// Name matched against role assignments.
    pub agent_name: String,
}

impl WorkerConfig {
    /// Defaults for `role`.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            worker_id: WorkerId::new(role.default_worker_id()),
            marketplace_root: PathBuf::from("."),
            prefetch: 1,
            heartbeat_interval: Duration::from_secs(10),
            agent_name: role.default_worker_id().to_string(),
        }
    }

    pub fn with_marketplace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.marketplace_root = root.into();
        self
    }

    pub fn with_worker_id(mut self, worker_id: WorkerId) -> Self {
        self.worker_id = worker_id;
        self
    }
}
