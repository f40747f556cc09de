//! PluginFleet Worker
//!
//! A worker serves exactly one role. It consumes that role's task queue one
//! message at a time, turns the wire command into a typed [`Command`],
//! runs the matching handler and publishes a correlated result. The task is
//! acknowledged only after its result is published, so a worker that dies
//! mid-task leaves the task to be redelivered.
//!
//! [`Command`]: pluginfleet_core::Command

pub mod config;
pub mod error;
pub mod handlers;
pub mod heartbeat;
pub mod roles;
pub mod runtime;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use handlers::{dispatch, HandlerError, Outcome};
pub use heartbeat::run_heartbeat_loop;
pub use roles::RoleResponder;
pub use runtime::WorkerRuntime;
