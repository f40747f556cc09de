//! Leader errors.

use pluginfleet_core::CoreError;
use pluginfleet_fabric::FabricError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaderError {
    #[error("Broker error: {0}")]
    Fabric(#[from] FabricError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// A command line that does not parse.
    #[error("Usage: {0}")]
    Usage(String),
}
