//! RabbitMQ broker client.

use async_trait::async_trait;
use lapin::acker::Acker;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicGetOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    QueuePurgeOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::{Acknowledge, Broker, BrokerConfig, Delivery, DeliveryStream, FabricError, Topology};

/// Persistent delivery mode.
const PERSISTENT: u8 = 2;

/// A single AMQP connection with one publishing channel.
///
/// Each call to [`Broker::consume`] opens its own channel so its prefetch
/// bound does not affect publishing.
pub struct AmqpBroker {
    connection: Connection,
    channel: Channel,
    exchange: String,
}

impl AmqpBroker {
    /// Connect to the broker described by `config`.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, FabricError> {
        info!(exchange = %config.topology.exchange, "Connecting to broker");

        let connection = Connection::connect(&config.uri, ConnectionProperties::default())
            .await
            .map_err(|e| FabricError::Connection(e.to_string()))?;
        let channel = connection.create_channel().await?;

        Ok(Self {
            connection,
            channel,
            exchange: config.topology.exchange.clone(),
        })
    }

    /// Close the connection.
    pub async fn close(&self) -> Result<(), FabricError> {
        self.connection.close(200, "Goodbye").await?;
        Ok(())
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn declare(&self, topology: &Topology) -> Result<(), FabricError> {
        self.channel
            .exchange_declare(
                &topology.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        for queue in topology.queues() {
            self.channel
                .queue_declare(
                    queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await?;
        }

        for binding in topology.bindings() {
            self.channel
                .queue_bind(
                    &binding.queue,
                    &topology.exchange,
                    &binding.pattern,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
            debug!(queue = %binding.queue, pattern = %binding.pattern, "Queue bound");
        }

        info!(exchange = %topology.exchange, "Topology declared");
        Ok(())
    }

    async fn publish(&self, routing_key: &str, payload: &[u8]) -> Result<(), FabricError> {
        let properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type("application/json".into());

        self.channel
            .basic_publish(
                &self.exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await?
            .await?;
        Ok(())
    }

    async fn consume(&self, queue: &str, prefetch: u16) -> Result<DeliveryStream, FabricError> {
        let channel = self.connection.create_channel().await?;
        if prefetch > 0 {
            channel
                .basic_qos(prefetch, BasicQosOptions::default())
                .await?;
        }

        let consumer = channel
            .basic_consume(
                queue,
                &format!("pluginfleet-{}", queue),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue = %queue, prefetch, "Consuming");

        // The channel lives as long as the stream does.
        let stream = consumer.map(move |delivery| {
            let _channel = &channel;
            delivery.map(into_delivery).map_err(FabricError::from)
        });
        Ok(Box::pin(stream))
    }

    async fn get(&self, queue: &str) -> Result<Option<Delivery>, FabricError> {
        let message = self
            .channel
            .basic_get(queue, BasicGetOptions { no_ack: false })
            .await?;
        Ok(message.map(|m| into_delivery(m.delivery)))
    }

    async fn purge(&self, queue: &str) -> Result<u32, FabricError> {
        let purged = self
            .channel
            .queue_purge(queue, QueuePurgeOptions::default())
            .await?;
        Ok(purged)
    }
}

struct AmqpAcker(Acker);

#[async_trait]
impl Acknowledge for AmqpAcker {
    async fn ack(&self) -> Result<(), FabricError> {
        self.0.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<(), FabricError> {
        self.0
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

fn into_delivery(delivery: lapin::message::Delivery) -> Delivery {
    Delivery::new(
        delivery.routing_key.as_str(),
        delivery.data,
        Box::new(AmqpAcker(delivery.acker)),
    )
}
