//! Exchange, queue and binding layout.

use pluginfleet_core::Role;

/// Routing keys and binding patterns.
pub mod keys {
    use pluginfleet_core::Role;

    /// Pattern the shared result queue is bound with.
    pub const RESULTS_PATTERN: &str = "results.*";
    /// Pattern the heartbeat queue is bound with.
    pub const HEARTBEAT_PATTERN: &str = "heartbeat.*";
    /// Fan-out key for broadcasts.
    pub const BROADCAST: &str = "broadcast.all";
    /// Key role assignments are published with.
    pub const ROLE_ASSIGN: &str = "roles.assign";
    /// Key role acknowledgements are published with.
    pub const ROLE_ACK: &str = "roles.ack";

    /// `tasks.<role>`
    pub fn task(role: Role) -> String {
        format!("tasks.{}", role)
    }

    /// `results.<role>`
    pub fn result(role: Role) -> String {
        format!("results.{}", role)
    }

    /// `heartbeat.<role>`
    pub fn heartbeat(role: Role) -> String {
        format!("heartbeat.{}", role)
    }
}

/// A queue bound to the exchange under a routing-key pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub queue: String,
    pub pattern: String,
}

impl Binding {
    fn new(queue: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            pattern: pattern.into(),
        }
    }
}

/// Everything declared on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Topic exchange name.
    pub exchange: String,

    /// Durable task queue of the lifecycle role.
    pub lifecycle_task_queue: String,

    /// Durable task queue of the manifest role.
    pub manifest_task_queue: String,

    /// Shared queue all results land in.
    pub result_queue: String,

    /// Queue receiving broadcasts.
    pub broadcast_queue: String,

    /// Queue receiving worker heartbeats.
    pub heartbeat_queue: String,

    /// Queue role assignments are delivered to.
    pub role_assignment_queue: String,

    /// Queue role acknowledgements are delivered to.
    pub role_ack_queue: String,
}

impl Topology {
    /// Task queue of `role`.
    pub fn task_queue(&self, role: Role) -> &str {
        match role {
            Role::Lifecycle => &self.lifecycle_task_queue,
            Role::Manifest => &self.manifest_task_queue,
        }
    }

    /// Every queue name, in declaration order.
    pub fn queues(&self) -> Vec<&str> {
        let mut queues: Vec<&str> = Role::ALL.iter().map(|role| self.task_queue(*role)).collect();
        queues.extend([
            self.result_queue.as_str(),
            self.broadcast_queue.as_str(),
            self.heartbeat_queue.as_str(),
            self.role_assignment_queue.as_str(),
            self.role_ack_queue.as_str(),
        ]);
        queues
    }

    /// Every queue binding.
    pub fn bindings(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = Role::ALL
            .iter()
            .map(|role| Binding::new(self.task_queue(*role), keys::task(*role)))
            .collect();
        bindings.push(Binding::new(&self.result_queue, keys::RESULTS_PATTERN));
        bindings.push(Binding::new(&self.broadcast_queue, keys::BROADCAST));
        bindings.push(Binding::new(&self.heartbeat_queue, keys::HEARTBEAT_PATTERN));
        bindings.push(Binding::new(&self.role_assignment_queue, keys::ROLE_ASSIGN));
        bindings.push(Binding::new(&self.role_ack_queue, keys::ROLE_ACK));
        bindings
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            exchange: "agent_exchange".to_string(),
            lifecycle_task_queue: keys::task(Role::Lifecycle),
            manifest_task_queue: keys::task(Role::Manifest),
            result_queue: "results.guardian".to_string(),
            broadcast_queue: "broadcast.all".to_string(),
            heartbeat_queue: "heartbeats".to_string(),
            role_assignment_queue: "role_assignments".to_string(),
            role_ack_queue: "role_acknowledgments".to_string(),
        }
    }
}

/// AMQP topic matching: words are separated by `.`, `*` matches exactly
/// one word and `#` matches zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.first(), key.first()) {
        (None, None) => true,
        (Some(&"#"), _) => {
            match_words(&pattern[1..], key) || (!key.is_empty() && match_words(pattern, &key[1..]))
        }
        (Some(&"*"), Some(_)) => match_words(&pattern[1..], &key[1..]),
        (Some(p), Some(k)) if p == k => match_words(&pattern[1..], &key[1..]),
        _ => false,
    }
}
