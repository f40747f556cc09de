//! The broker seam shared by the AMQP and in-process implementations.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_stream::Stream;

use crate::{FabricError, Topology};

/// Stream of deliveries from one consumer.
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery, FabricError>> + Send>>;

/// Settles a single delivery with the broker.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    /// Confirm the delivery was handled; the broker forgets it.
    async fn ack(&self) -> Result<(), FabricError>;

    /// Refuse the delivery, optionally putting it back on its queue.
    async fn reject(&self, requeue: bool) -> Result<(), FabricError>;
}

/// A message handed to a consumer. Must be settled with [`Delivery::ack`] or
/// [`Delivery::reject`]; until then the broker counts it against prefetch.
pub struct Delivery {
    /// Key the message was published with.
    pub routing_key: String,

    /// Raw payload bytes.
    pub payload: Vec<u8>,

    acker: Box<dyn Acknowledge>,
}

impl Delivery {
    /// Create a new Delivery.
    pub fn new(routing_key: impl Into<String>, payload: Vec<u8>, acker: Box<dyn Acknowledge>) -> Self {
        Self {
            routing_key: routing_key.into(),
            payload,
            acker,
        }
    }

    /// Decode the payload as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FabricError> {
        crate::decode(&self.payload)
    }

    pub async fn ack(&self) -> Result<(), FabricError> {
        self.acker.ack().await
    }

    pub async fn reject(&self, requeue: bool) -> Result<(), FabricError> {
        self.acker.reject(requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("routing_key", &self.routing_key)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// A connection to a topic-routed message broker.
///
/// Every publish is persistent; every consume uses manual acknowledgement.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Declare the exchange, queues and bindings.
    ///
    /// Idempotent: safe to call on every process start.
    async fn declare(&self, topology: &Topology) -> Result<(), FabricError>;

    /// Publish `payload` to the exchange under `routing_key`.
    async fn publish(&self, routing_key: &str, payload: &[u8]) -> Result<(), FabricError>;

    /// Start consuming `queue` with at most `prefetch` unacknowledged
    /// deliveries outstanding (`0` means unbounded).
    async fn consume(&self, queue: &str, prefetch: u16) -> Result<DeliveryStream, FabricError>;

    /// Fetch one message from `queue` without subscribing.
    async fn get(&self, queue: &str) -> Result<Option<Delivery>, FabricError>;

    /// Discard every ready message in `queue`, returning how many.
    async fn purge(&self, queue: &str) -> Result<u32, FabricError>;
}
