//! # Consumer-Group Contracts
//!
//! Abstractions over a partitioned consumer group: a session spanning one generation
//! of the group, one claim per assigned partition, and the handler driven by
//! [`run_consumer_group_session`](super::run_consumer_group_session).

use crate::error::PipelineResult;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Message delivered from a claimed partition
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub value: Bytes,
    pub timestamp: DateTime<Utc>,
}

/// One generation of a consumer group
pub trait ConsumerGroupSession: Send + Sync {
    fn generation_id(&self) -> i32;

    fn member_id(&self) -> &str;

    /// Claimed partitions by topic
    fn claims(&self) -> HashMap<String, Vec<i32>>;

    /// Mark a message as consumed; the next committed offset becomes `offset + 1`
    fn mark_message(&self, message: &ConsumerMessage);

    /// Root cancellation signal of the session
    fn cancellation(&self) -> &CancellationToken;
}

/// Stream of messages from a single claimed partition
#[derive(Debug)]
pub struct ConsumerGroupClaim {
    topic: String,
    partition: i32,
    initial_offset: i64,
    messages: mpsc::Receiver<ConsumerMessage>,
}

impl ConsumerGroupClaim {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        initial_offset: i64,
        messages: mpsc::Receiver<ConsumerMessage>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            initial_offset,
            messages,
        }
    }

    /// Build a claim fed through the returned sender
    pub fn channel(
        topic: impl Into<String>,
        partition: i32,
        initial_offset: i64,
        capacity: usize,
    ) -> (mpsc::Sender<ConsumerMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(topic, partition, initial_offset, rx))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }

    pub fn initial_offset(&self) -> i64 {
        self.initial_offset
    }

    /// Next message, or `None` once the partition has been revoked
    pub async fn next_message(&mut self) -> Option<ConsumerMessage> {
        self.messages.recv().await
    }
}

/// Callbacks invoked over the life of a consumer-group session
#[async_trait]
pub trait ConsumerGroupHandler: Send + Sync {
    /// Run before any claim is consumed
    async fn setup(&self, session: &dyn ConsumerGroupSession) -> PipelineResult<()>;

    /// Run after every claim loop has exited
    async fn cleanup(&self, session: &dyn ConsumerGroupSession) -> PipelineResult<()>;

    /// Process one partition until it is revoked or the session is cancelled
    async fn consume_claim(
        &self,
        session: &dyn ConsumerGroupSession,
        claim: ConsumerGroupClaim,
    ) -> PipelineResult<()>;
}
