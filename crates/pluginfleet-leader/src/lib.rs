//! PluginFleet Leader
//!
//! The leader turns user commands into task messages, publishes them to the
//! owning role's queue and keeps a table of tasks still waiting for a
//! result. A listener on its own broker connection forwards every inbound
//! result and heartbeat over a channel to the reconciler, which owns all
//! updates to the pending and results tables and expires tasks whose
//! deadline has passed.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod leader;
pub mod listener;
pub mod reconciler;
pub mod review;
pub mod session;
pub mod state;

pub use command::{parse_line, LeaderCommand};
pub use config::LeaderConfig;
pub use dispatcher::Dispatcher;
pub use error::LeaderError;
pub use leader::Leader;
pub use listener::{Inbound, ResultListener};
pub use reconciler::Reconciler;
pub use review::{Review, Verdict};
pub use session::{Flow, Session};
pub use state::{Correlation, LeaderState, PendingTask, TaskRecord, WorkerSighting};
