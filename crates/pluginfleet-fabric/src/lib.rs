//! PluginFleet Message Fabric
//!
//! Declares the topic exchange, the durable queues and their routing-key
//! bindings, and provides the broker clients the leader and the workers
//! talk through:
//!
//! - [`AmqpBroker`]: a RabbitMQ connection (AMQP 0-9-1).
//! - [`MemoryBroker`]: an in-process topic exchange with the same
//!   acknowledgement and prefetch semantics, used by tests and local runs.

pub mod amqp;
pub mod broker;
pub mod codec;
pub mod config;
pub mod error;
pub mod handshake;
pub mod memory;
pub mod topology;

pub use amqp::AmqpBroker;
pub use broker::{Acknowledge, Broker, Delivery, DeliveryStream};
pub use codec::{decode, encode, publish_json};
pub use config::BrokerConfig;
pub use error::FabricError;
pub use handshake::{request_reply, ReplyWait};
pub use memory::MemoryBroker;
pub use topology::{keys, topic_matches, Binding, Topology};
