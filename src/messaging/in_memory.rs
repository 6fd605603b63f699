//! # In-Memory Broker
//!
//! Partitioned log used by tests and local wiring. Implements [`MessageProducer`] and
//! serves finite consumer-group claims from the last committed offset of a group.
//!
//! - Keyed messages go to `fnv1a(key) % partitions`; keyless messages are spread
//!   round robin.
//! - Offsets are committed per `(group, topic, partition)` through
//!   [`ConsumerGroupSession::mark_message`].
//! - Producer failures can be injected with [`InMemoryBroker::fail_next_sends`].

use super::consumer::{ConsumerGroupClaim, ConsumerGroupHandler, ConsumerGroupSession, ConsumerMessage};
use super::consumer_group::run_consumer_group_session;
use super::producer::{MessageProducer, ProducerMessage};
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

type OffsetKey = (String, String, i32);

#[derive(Debug, Default)]
struct BrokerState {
    /// topic -> partitions -> messages (index == offset)
    topics: HashMap<String, Vec<Vec<ConsumerMessage>>>,
    /// (group, topic, partition) -> next offset to consume
    committed: HashMap<OffsetKey, i64>,
    produce_faults: VecDeque<PipelineError>,
}

#[derive(Debug)]
pub struct InMemoryBroker {
    partitions: i32,
    state: Mutex<BrokerState>,
    round_robin: AtomicUsize,
    generation: AtomicI32,
}

fn fnv1a(key: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

impl InMemoryBroker {
    pub fn new(partitions: i32) -> Arc<Self> {
        Arc::new(Self {
            partitions: partitions.max(1),
            state: Mutex::new(BrokerState::default()),
            round_robin: AtomicUsize::new(0),
            generation: AtomicI32::new(0),
        })
    }

    pub fn partitions(&self) -> i32 {
        self.partitions
    }

    /// Partition a keyed message lands on
    pub fn partition_for_key(&self, key: &str) -> i32 {
        (fnv1a(key.as_bytes()) % self.partitions as u32) as i32
    }

    /// Make the next `count` sends fail with `error`
    pub fn fail_next_sends(&self, count: usize, error: PipelineError) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.produce_faults.push_back(error.clone());
        }
    }

    /// Every message of a topic, ordered by partition then offset
    pub fn messages(&self, topic: &str) -> Vec<ConsumerMessage> {
        let state = self.state.lock();
        state
            .topics
            .get(topic)
            .map(|partitions| partitions.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    pub fn partition_messages(&self, topic: &str, partition: i32) -> Vec<ConsumerMessage> {
        let state = self.state.lock();
        state
            .topics
            .get(topic)
            .and_then(|partitions| partitions.get(partition as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// Next offset the group will consume from, if it ever committed on that partition
    pub fn committed_offset(&self, group: &str, topic: &str, partition: i32) -> Option<i64> {
        let state = self.state.lock();
        state
            .committed
            .get(&(group.to_string(), topic.to_string(), partition))
            .copied()
    }

    fn commit(&self, group: &str, message: &ConsumerMessage) {
        let mut state = self.state.lock();
        let entry = state
            .committed
            .entry((group.to_string(), message.topic.clone(), message.partition))
            .or_insert(0);
        // Offsets never move backwards
        *entry = (*entry).max(message.offset + 1);
    }

    /// Build finite claims over every partition of `topic`, starting at the group's
    /// committed offsets; each claim ends after the last stored message
    pub fn claims(&self, group: &str, topic: &str) -> Vec<ConsumerGroupClaim> {
        let state = self.state.lock();
        (0..self.partitions)
            .map(|partition| {
                let start = state
                    .committed
                    .get(&(group.to_string(), topic.to_string(), partition))
                    .copied()
                    .unwrap_or(0);
                let pending: Vec<ConsumerMessage> = state
                    .topics
                    .get(topic)
                    .and_then(|partitions| partitions.get(partition as usize))
                    .map(|messages| {
                        messages
                            .iter()
                            .filter(|m| m.offset >= start)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();

                let (tx, rx) = mpsc::channel(pending.len().max(1));
                for message in pending {
                    // Capacity covers every pending message
                    let _ = tx.try_send(message);
                }
                ConsumerGroupClaim::new(topic, partition, start, rx)
            })
            .collect()
    }

    /// Open a session for `group` whose marks commit back into this broker
    pub fn session(
        self: &Arc<Self>,
        group: &str,
        topic: &str,
        cancellation: CancellationToken,
    ) -> Arc<InMemorySession> {
        let generation_id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let claims = HashMap::from([(topic.to_string(), (0..self.partitions).collect())]);
        Arc::new(InMemorySession {
            broker: Arc::clone(self),
            group: group.to_string(),
            member_id: format!("{group}-{}", Uuid::new_v4()),
            generation_id,
            claims,
            cancellation,
            marked: Mutex::new(Vec::new()),
        })
    }

    /// Run one consumer-group generation over everything currently stored in `topic`
    pub async fn run_consumer_group<H>(
        self: &Arc<Self>,
        group: &str,
        topic: &str,
        handler: Arc<H>,
        cancellation: CancellationToken,
    ) -> PipelineResult<()>
    where
        H: ConsumerGroupHandler + 'static,
    {
        let session = self.session(group, topic, cancellation);
        let claims = self.claims(group, topic);
        run_consumer_group_session(session, claims, handler).await
    }
}

#[async_trait]
impl MessageProducer for InMemoryBroker {
    async fn send_message(&self, message: ProducerMessage) -> PipelineResult<(i32, i64)> {
        let mut state = self.state.lock();
        if let Some(error) = state.produce_faults.pop_front() {
            return Err(error);
        }

        let partition = match &message.key {
            Some(key) => self.partition_for_key(key),
            None => (self.round_robin.fetch_add(1, Ordering::SeqCst) % self.partitions as usize) as i32,
        };

        let partitions = state
            .topics
            .entry(message.topic.clone())
            .or_insert_with(|| vec![Vec::new(); self.partitions as usize]);
        let log = &mut partitions[partition as usize];
        let offset = log.len() as i64;
        log.push(ConsumerMessage {
            topic: message.topic,
            partition,
            offset,
            key: message.key,
            value: message.value,
            timestamp: chrono::Utc::now(),
        });

        debug!(partition = partition, offset = offset, "Stored message");
        Ok((partition, offset))
    }
}

/// Session handed to handlers by [`InMemoryBroker::run_consumer_group`]
#[derive(Debug)]
pub struct InMemorySession {
    broker: Arc<InMemoryBroker>,
    group: String,
    member_id: String,
    generation_id: i32,
    claims: HashMap<String, Vec<i32>>,
    cancellation: CancellationToken,
    marked: Mutex<Vec<ConsumerMessage>>,
}

impl InMemorySession {
    /// Messages marked during this session, in marking order
    pub fn marked(&self) -> Vec<ConsumerMessage> {
        self.marked.lock().clone()
    }
}

impl ConsumerGroupSession for InMemorySession {
    fn generation_id(&self) -> i32 {
        self.generation_id
    }

    fn member_id(&self) -> &str {
        &self.member_id
    }

    fn claims(&self) -> HashMap<String, Vec<i32>> {
        self.claims.clone()
    }

    fn mark_message(&self, message: &ConsumerMessage) {
        self.broker.commit(&self.group, message);
        self.marked.lock().push(message.clone());
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
