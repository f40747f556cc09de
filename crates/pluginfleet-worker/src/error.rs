//! Worker errors.

use pluginfleet_core::CoreError;
use pluginfleet_fabric::FabricError;
use thiserror::Error;

/// Errors that stop a worker loop.
///
/// Problems with a single task never show up here; they become `failed`
/// results.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Broker error: {0}")]
    Fabric(#[from] FabricError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
