//! # Retry Loop
//!
//! Runs a [`Retryable`] operation under an [`ExponentialBackoff`] policy. Each attempt
//! reports whether its failure is transient (wait and try again) or permanent (stop
//! now). The backoff sleep observes the cancellation token.

use super::backoff::ExponentialBackoff;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError {
    Transient(PipelineError),
    Permanent(PipelineError),
}

impl RetryError {
    pub fn into_inner(self) -> PipelineError {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }
}

/// Operation that can be attempted repeatedly
#[async_trait]
pub trait Retryable: Send {
    type Output: Send;

    async fn attempt(&mut self) -> Result<Self::Output, RetryError>;
}

/// Attempt `operation` until it succeeds, fails permanently or exhausts the policy
///
/// `notify` is called with the error and the wait before every retry. When the budget
/// runs out the last transient error is returned; cancellation during a wait returns
/// [`PipelineError::Canceled`].
pub async fn retry_notify<R, N>(
    policy: &ExponentialBackoff,
    cancellation: &CancellationToken,
    operation: &mut R,
    mut notify: N,
) -> PipelineResult<R::Output>
where
    R: Retryable,
    N: FnMut(&PipelineError, Duration) + Send,
{
    let mut backoff = policy.start();

    loop {
        let error = match operation.attempt().await {
            Ok(output) => return Ok(output),
            Err(RetryError::Permanent(error)) => return Err(error),
            Err(RetryError::Transient(error)) => error,
        };

        let Some(wait) = backoff.next_backoff() else {
            return Err(error);
        };
        notify(&error, wait);

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(PipelineError::Canceled),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
