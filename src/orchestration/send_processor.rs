//! # Send Processor
//!
//! Dispatches each envelope's job under the backoff policy and decides, per failed
//! attempt, whether to retry, reset and resend, recover or fail the job.
//!
//! | Attempt error              | Action                                                  |
//! |----------------------------|---------------------------------------------------------|
//! | cancellation / deadline    | stop, propagate                                         |
//! | connection class           | retry under backoff                                     |
//! | any, child job             | mark `Failed`                                           |
//! | invalid nonce              | reset nonce/hash/raw, mark `Recovering`, retry          |
//! | anything else              | emit to the recover topic, mark `Failed`                |
//!
//! A failed follow-up action (status write, recovery emission) retries the whole
//! attempt when it is a connection error and stops processing otherwise. Follow-ups
//! share the message's backoff budget.

use super::dispatcher::JobDispatcher;
use super::envelope_emitter::EnvelopeEmitter;
use super::error_classifier::{classify_error, classify_follow_up, ErrorClass};
use super::job_status_updater::{JobStatusUpdater, StatusUpdateOutcome};
use super::message_listener::EnvelopeProcessor;
use crate::client::JobContext;
use crate::config::PipelineConfig;
use crate::constants::components;
use crate::error::{PipelineError, PipelineResult};
use crate::messaging::Envelope;
use crate::models::Job;
use crate::resilience::{retry_notify, ExponentialBackoff, RetryError, Retryable};
use crate::state_machine::JobStatus;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SendProcessor {
    dispatcher: Arc<JobDispatcher>,
    emitter: EnvelopeEmitter,
    updater: JobStatusUpdater,
    backoff: ExponentialBackoff,
    recover_topic: String,
    store_id: String,
}

impl SendProcessor {
    pub fn new(
        dispatcher: Arc<JobDispatcher>,
        emitter: EnvelopeEmitter,
        updater: JobStatusUpdater,
        backoff: ExponentialBackoff,
        recover_topic: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            emitter,
            updater,
            backoff,
            recover_topic: recover_topic.into(),
            store_id: store_id.into(),
        }
    }

    /// Wire a processor from the loaded configuration
    pub fn from_config(
        config: &PipelineConfig,
        dispatcher: Arc<JobDispatcher>,
        emitter: EnvelopeEmitter,
        updater: JobStatusUpdater,
    ) -> Self {
        Self::new(
            dispatcher,
            emitter,
            updater,
            ExponentialBackoff::from(&config.backoff),
            config.kafka.recover_topic.clone(),
            config.listener.key_store_name.clone(),
        )
    }
}

#[async_trait]
impl EnvelopeProcessor for SendProcessor {
    fn component(&self) -> &'static str {
        components::SEND_PROCESSOR
    }

    async fn process(&self, ctx: &JobContext, envelope: Envelope) -> PipelineResult<()> {
        let job = Job::from_envelope(&envelope, &self.store_id);
        let mut attempt = SendAttempt {
            processor: self,
            ctx,
            envelope,
            job,
        };

        retry_notify(&self.backoff, ctx.cancellation(), &mut attempt, |error, wait| {
            warn!(error = %error, retry_in = ?wait, "error processing job, retrying");
        })
        .await
        .map_err(|e| e.extend_component(components::SEND_PROCESSOR))
    }
}

/// One message's progress through the retry loop
struct SendAttempt<'a> {
    processor: &'a SendProcessor,
    ctx: &'a JobContext,
    envelope: Envelope,
    job: Job,
}

impl SendAttempt<'_> {
    async fn mark(
        &self,
        status: JobStatus,
        cause: &PipelineError,
    ) -> PipelineResult<StatusUpdateOutcome> {
        self.processor
            .updater
            .update(self.ctx, &self.job.uuid, status, &cause.to_string(), None)
            .await
    }

    /// Terminal path: annotate the envelope, publish it for remediation, fail the job
    async fn recover(&mut self, cause: &PipelineError) -> PipelineResult<()> {
        self.envelope.append_error(cause.to_coded());
        self.processor
            .emitter
            .recover(self.ctx, &self.envelope, &self.processor.recover_topic)
            .await?;
        self.mark(JobStatus::Failed, cause).await?;
        Ok(())
    }

    fn follow_up_failed(&self, error: PipelineError) -> RetryError {
        if self.ctx.is_cancelled() {
            return RetryError::Permanent(PipelineError::Canceled);
        }
        classify_follow_up(error)
    }
}

#[async_trait]
impl Retryable for SendAttempt<'_> {
    type Output = ();

    async fn attempt(&mut self) -> Result<(), RetryError> {
        let error = match self.processor.dispatcher.dispatch(self.ctx, &mut self.job).await {
            Ok(()) => {
                debug!(job_uuid = %self.job.uuid, "job sent");
                return Ok(());
            }
            Err(error) => error,
        };

        let class = classify_error(&error);
        match class {
            ErrorClass::Context => return Err(RetryError::Permanent(error)),
            _ if self.ctx.is_cancelled() => {
                return Err(RetryError::Permanent(PipelineError::Canceled))
            }
            ErrorClass::Connection => return Err(RetryError::Transient(error)),
            ErrorClass::InvalidNonce | ErrorClass::Terminal => {}
        }

        let follow_up = if self.job.is_child() {
            // Children never retry
            info!(job_uuid = %self.job.uuid, error = %error, "child job failed");
            self.mark(JobStatus::Failed, &error).await.map(|_| ())
        } else if class == ErrorClass::InvalidNonce {
            self.envelope.reset_transaction();
            self.job = Job::from_envelope(&self.envelope, &self.processor.store_id);

            match self.mark(JobStatus::Recovering, &error).await {
                // Resend the reset transaction
                Ok(StatusUpdateOutcome::Applied(_)) => return Err(RetryError::Transient(error)),
                Ok(StatusUpdateOutcome::Skipped { .. }) => Ok(()),
                Err(e) => Err(e),
            }
        } else {
            self.recover(&error).await
        };

        follow_up.map_err(|e| self.follow_up_failed(e))
    }
}
