//! # Resilience
//!
//! Bounded exponential backoff and the retry loop built on it.

pub mod backoff;
pub mod retry;

pub use backoff::{BackoffState, ExponentialBackoff};
pub use retry::{retry_notify, RetryError, Retryable};
