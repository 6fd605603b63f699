//! # Error Classification
//!
//! Single place where pipeline errors are mapped to retry decisions. Only the error
//! code class matters here; component tags are ignored.

use crate::error::PipelineError;
use crate::resilience::RetryError;

/// Retry-relevant class of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Cancellation or deadline: stop, no recovery emission
    Context,
    /// Downstream unavailable: retry under backoff
    Connection,
    /// Nonce race in transaction submission: reset and resend
    InvalidNonce,
    /// Everything else: the job cannot succeed as is
    Terminal,
}

pub fn classify_error(error: &PipelineError) -> ErrorClass {
    if error.is_context_error() {
        ErrorClass::Context
    } else if error.is_connection_error() || error.is_dependency_failure() {
        ErrorClass::Connection
    } else if error.is_invalid_nonce_warning() {
        ErrorClass::InvalidNonce
    } else {
        ErrorClass::Terminal
    }
}

/// Retry decision for a failed follow-up action (status update, recovery emission)
///
/// Connection failures retry the whole attempt; anything else, including
/// cancellation, ends processing of the message.
pub fn classify_follow_up(error: PipelineError) -> RetryError {
    match classify_error(&error) {
        ErrorClass::Connection => RetryError::Transient(error),
        _ => RetryError::Permanent(error),
    }
}
