//! # Messaging
//!
//! Envelope model and wire codec, producer and consumer-group contracts, the
//! consumer-group session driver and an in-memory broker implementing them.

pub mod codec;
pub mod consumer;
pub mod consumer_group;
pub mod envelope;
pub mod in_memory;
pub mod producer;
pub mod proto;

pub use codec::{decode_envelope, encode_request, encode_response};
pub use consumer::{ConsumerGroupClaim, ConsumerGroupHandler, ConsumerGroupSession, ConsumerMessage};
pub use consumer_group::run_consumer_group_session;
pub use envelope::Envelope;
pub use in_memory::{InMemoryBroker, InMemorySession};
pub use producer::{MessageProducer, ProducerMessage};
