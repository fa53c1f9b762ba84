//! AMQP 0-9-1 broker backed by lapin.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::debug;

use super::broker::{BrokerConnector, BrokerSession, OutboundMessage, QueueSpec};
use crate::error::NotifyError;

const PERSISTENT_DELIVERY: u8 = 2;
const REPLY_SUCCESS: u16 = 200;

/// Connects to an AMQP broker such as RabbitMQ.
#[derive(Debug, Clone)]
pub struct AmqpConnector {
    broker_url: String,
}

impl AmqpConnector {
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
        }
    }

    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self, queue: &QueueSpec) -> Result<Box<dyn BrokerSession>, NotifyError> {
        let connect_err = |e: lapin::Error| NotifyError::BrokerConnect(e.to_string());

        let connection = Connection::connect(&self.broker_url, ConnectionProperties::default())
            .await
            .map_err(connect_err)?;
        let channel = connection.create_channel().await.map_err(connect_err)?;

        let options = QueueDeclareOptions {
            durable: queue.durable,
            exclusive: queue.exclusive,
            auto_delete: queue.auto_delete,
            ..Default::default()
        };
        channel
            .queue_declare(&queue.name, options, FieldTable::default())
            .await
            .map_err(connect_err)?;

        debug!(queue = %queue.name, "AMQP queue declared");
        Ok(Box::new(AmqpSession {
            connection,
            channel,
        }))
    }
}

struct AmqpSession {
    connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerSession for AmqpSession {
    fn is_open(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }

    async fn publish(&self, queue: &str, message: &OutboundMessage) -> Result<(), NotifyError> {
        let mut properties = BasicProperties::default()
            .with_content_type(message.content_type.into())
            .with_message_id(message.message_id.as_str().into());
        if message.persistent {
            properties = properties.with_delivery_mode(PERSISTENT_DELIVERY);
        }

        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &message.payload,
                properties,
            )
            .await?
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), NotifyError> {
        if self.channel.status().connected() {
            self.channel.close(REPLY_SUCCESS, "notifier shutdown").await?;
        }
        if self.connection.status().connected() {
            self.connection.close(REPLY_SUCCESS, "notifier shutdown").await?;
        }
        Ok(())
    }
}
