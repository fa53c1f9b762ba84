//! Broker seam used by the queue notifier.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Declaration of the destination queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
}

impl QueueSpec {
    /// Durable, shared queue that survives consumer disconnects
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            exclusive: false,
            auto_delete: false,
        }
    }
}

/// One message ready to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub message_id: String,
    pub content_type: &'static str,
    pub payload: Vec<u8>,
    /// Survive a broker restart
    pub persistent: bool,
}

/// Opens sessions against a broker. Connecting also declares the queue.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, queue: &QueueSpec) -> Result<Box<dyn BrokerSession>, NotifyError>;
}

/// An open connection plus channel.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    fn is_open(&self) -> bool;

    async fn publish(&self, queue: &str, message: &OutboundMessage) -> Result<(), NotifyError>;

    async fn close(&self) -> Result<(), NotifyError>;
}
