//! Worker roles and their fixed addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Identifier the leader stamps into the `from` field of its messages.
pub const LEADER_ID: &str = "guardian-001";

/// A fixed category of worker with its own task queue and vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Plugin lifecycle operations (health, diagnose, fix, install, ...).
    Lifecycle,
    /// Manifest and structure validation.
    Manifest,
}

impl Role {
    /// Every worker role, in display order.
    pub const ALL: [Role; 2] = [Role::Lifecycle, Role::Manifest];

    /// Wire name of the role, also the routing key suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lifecycle => "lifecycle",
            Role::Manifest => "manifest",
        }
    }

    /// Default identifier of the worker filling this role.
    pub fn default_worker_id(&self) -> &'static str {
        match self {
            Role::Lifecycle => "lifecycle-001",
            Role::Manifest => "manifest-001",
        }
    }

    /// Human-readable worker name reported in results.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Lifecycle => "Plugin Lifecycle Agent",
            Role::Manifest => "Plugin Manifest Agent",
        }
    }

    /// Command names this role accepts.
    pub fn commands(&self) -> &'static [&'static str] {
        match self {
            Role::Lifecycle => &["health", "diagnose", "fix", "install", "update", "rollback"],
            Role::Manifest => &[
                "validate",
                "check_schema",
                "check_structure",
                "publication_ready",
            ],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lifecycle" => Ok(Role::Lifecycle),
            "manifest" => Ok(Role::Manifest),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}
