use crate::error::PipelineResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Message handed to a producer
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerMessage {
    pub topic: String,
    /// Partition key; `None` lets the transport choose the partition
    pub key: Option<String>,
    pub value: Bytes,
}

impl ProducerMessage {
    pub fn new(topic: impl Into<String>, key: impl Into<String>, value: Bytes) -> Self {
        let key = key.into();
        Self {
            topic: topic.into(),
            key: (!key.is_empty()).then_some(key),
            value,
        }
    }
}

/// Synchronous-ack producer shared by every partition worker
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a message and return the `(partition, offset)` it was written at
    async fn send_message(&self, message: ProducerMessage) -> PipelineResult<(i32, i64)>;
}
