//! PluginFleet Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - The message broker
//! - The filesystem
//! - Runtime specifics
//!
//! Everything exchanged between the leader and its workers is defined here.

pub mod command;
pub mod error;
pub mod ids;
pub mod message;
pub mod role;
pub mod status;

// Re-export commonly used types
pub use command::{
    Command, LifecycleCommand, ManifestCommand, Params, SchemaType, ValidationKind,
};
pub use error::CoreError;
pub use ids::{TaskId, WorkerId};
pub use message::{
    BroadcastMessage, Heartbeat, MessageKind, ResultMessage, RoleAck, RoleAssignment, TaskMessage,
};
pub use role::{Role, LEADER_ID};
pub use status::{ResultStatus, TaskOutcome, WorkerState};
