//! # Job Models
//!
//! Value objects handed to the send and sign use cases.

pub mod job;
pub mod transaction;

pub use job::{InternalData, Job, JobType, SendStrategy};
pub use transaction::{normalize_address, normalize_hash, EthTransaction};
