//! Fabric errors.

use thiserror::Error;

/// Errors raised while talking to the broker.
#[derive(Debug, Error)]
pub enum FabricError {
    /// The broker could not be reached. Fatal at process start.
    #[error("Broker connection failed: {0}")]
    Connection(String),

    /// Protocol-level failure reported by the AMQP client.
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// Publishing or consuming against a queue that was never declared.
    #[error("Queue not declared: {0}")]
    UnknownQueue(String),

    /// Payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A delivery was acked or rejected twice.
    #[error("Delivery already settled")]
    AlreadySettled,

    /// No reply arrived before the deadline.
    #[error("Timeout waiting for reply on '{0}'")]
    Timeout(String),
}
