//! Per-message call context.

use crate::error::{PipelineError, PipelineResult};
use crate::messaging::Envelope;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Identity, credentials and cancellation forwarded into every remote call made while
/// processing one message
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    pub tenant_id: String,
    pub username: String,
    /// Bearer token forwarded to the signing backend
    pub authorization: Option<String>,
    cancellation: CancellationToken,
    call_timeout: Option<Duration>,
}

impl JobContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            ..Default::default()
        }
    }

    pub fn from_envelope(
        envelope: &Envelope,
        cancellation: CancellationToken,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            tenant_id: envelope.tenant_id().to_string(),
            username: envelope.username().to_string(),
            authorization: envelope.bearer_authorization().map(str::to_string),
            cancellation,
            call_timeout,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Run a remote call, aborting it on cancellation or when the call deadline passes
    pub async fn guard<F, T>(&self, call: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        let bounded = async {
            match self.call_timeout {
                Some(timeout) => tokio::time::timeout(timeout, call)
                    .await
                    .unwrap_or(Err(PipelineError::DeadlineExceeded)),
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(PipelineError::Canceled),
            result = bounded => result,
        }
    }
}
