//! Message envelopes exchanged over the broker.
//!
//! Every envelope carries a `type` discriminator so a consumer bound to a
//! wildcard key can tell what it received.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Command, Params, ResultStatus, Role, TaskId, WorkerId};

/// Envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Task,
    Result,
    Heartbeat,
    Broadcast,
}

fn default_priority() -> u8 {
    1
}

/// Envelope timestamps are metadata only. Producers send RFC 3339 or a
/// naive ISO 8601 time, which is read as UTC; anything unreadable becomes
/// the receipt time.
mod wire_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(parse(&raw).unwrap_or_else(Utc::now))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(stamp.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }
}

/// One unit of work, published by the leader to `tasks.<role>`.
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub task_id: TaskId,
    pub command: String,
    #[serde(default)]
    pub params: Params,
    pub assigned_worker: Role,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub from: String,
}

impl TaskMessage {
    /// Build a task for `command` with a freshly generated id.
    pub fn new(command: &Command, from: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Task,
            task_id: TaskId::generate(),
            command: command.name().to_string(),
            params: command.params(),
            assigned_worker: command.role(),
            priority: default_priority(),
            timestamp: Utc::now(),
            from: from.into(),
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.task_id = id;
        self
    }
}

/// Response to exactly one task, published to `results.<role>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub task_id: TaskId,
    /// Display name of the worker.
    pub worker: String,
    pub worker_id: WorkerId,
    pub status: ResultStatus,
    /// Command-specific payload.
    pub result: Value,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl ResultMessage {
    /// Create a result for `task_id`.
    pub fn new(
        task_id: TaskId,
        worker: impl Into<String>,
        worker_id: WorkerId,
        status: ResultStatus,
        result: Value,
        elapsed: Duration,
    ) -> Self {
        Self {
            kind: MessageKind::Result,
            task_id,
            worker: worker.into(),
            worker_id,
            status,
            result,
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Best-effort notice published to `broadcast.all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub from: String,
}

impl BroadcastMessage {
    pub fn new(message: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Broadcast,
            message: message.into(),
            timestamp: Utc::now(),
            from: from.into(),
        }
    }
}

/// Liveness announcement published by workers to `heartbeat.<role>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub worker: Role,
    pub worker_id: WorkerId,
    pub status: String,
    pub tasks_processed: u64,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl Heartbeat {
    pub fn alive(worker: Role, worker_id: WorkerId, tasks_processed: u64) -> Self {
        Self {
            kind: MessageKind::Heartbeat,
            worker,
            worker_id,
            status: "alive".to_string(),
            tasks_processed,
            timestamp: Utc::now(),
        }
    }
}

/// Role handed to an agent during the assignment handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: String,
    /// Target agent; empty means any listener may take it.
    #[serde(default)]
    pub agent: String,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub assigned_by: String,
}

impl RoleAssignment {
    pub fn new(role: impl Into<String>, agent: impl Into<String>, assigned_by: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            agent: agent.into(),
            timestamp: Utc::now(),
            assigned_by: assigned_by.into(),
        }
    }

    /// Returns true if `agent_name` should act on this assignment.
    pub fn is_for(&self, agent_name: &str) -> bool {
        self.agent.is_empty() || self.agent == agent_name
    }

    /// Returns true once the assignment is older than `ttl`.
    pub fn is_older_than(&self, ttl: Duration) -> bool {
        chrono::Duration::from_std(ttl)
            .map(|ttl| Utc::now() - self.timestamp > ttl)
            .unwrap_or(false)
    }
}

/// Reply to a role assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAck {
    pub status: String,
    pub agent: String,
    pub role: String,
    pub message: String,
    #[serde(default = "Utc::now", deserialize_with = "wire_time::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl RoleAck {
    pub fn accepted(agent: impl Into<String>, role: impl Into<String>) -> Self {
        let agent = agent.into();
        let role = role.into();
        Self {
            status: "accepted".to_string(),
            message: format!("{} accepted role: {}", agent, role),
            agent,
            role,
            timestamp: Utc::now(),
        }
    }
}
