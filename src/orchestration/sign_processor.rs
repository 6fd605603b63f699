//! # Sign Processor
//!
//! Signs each envelope's transaction and forwards it to the sender topic. The signer
//! is chosen from the job type: public jobs, EEA private jobs and Tessera marking
//! jobs each have their own signer. Raw jobs are forwarded with the raw they carry
//! and Tessera private jobs are forwarded unsigned. Every attempt signs again, so a
//! retried attempt never forwards a raw left over from an earlier one.
//!
//! Connection failures retry under the backoff policy; any other failure sends the
//! error-annotated envelope to the recover topic and fails the job.

use super::envelope_emitter::EnvelopeEmitter;
use super::error_classifier::{classify_error, classify_follow_up, ErrorClass};
use super::job_status_updater::JobStatusUpdater;
use super::message_listener::EnvelopeProcessor;
use crate::client::JobContext;
use crate::config::{ConfigResult, PipelineConfig};
use crate::constants::components;
use crate::error::{PipelineError, PipelineResult};
use crate::messaging::Envelope;
use crate::models::{Job, SendStrategy};
use crate::resilience::{retry_notify, ExponentialBackoff, RetryError, Retryable};
use crate::state_machine::JobStatus;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signed transaction returned by the key-management backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: String,
    pub tx_hash: String,
}

#[async_trait]
pub trait SignTransactionUseCase: Send + Sync {
    async fn execute(&self, ctx: &JobContext, job: &Job) -> PipelineResult<SignedTransaction>;
}

/// One signer per strategy that is signed at this stage
#[derive(Clone)]
pub struct SignUseCases {
    pub transaction: Arc<dyn SignTransactionUseCase>,
    pub eea_transaction: Arc<dyn SignTransactionUseCase>,
    pub tessera_marking: Arc<dyn SignTransactionUseCase>,
}

impl SignUseCases {
    /// Signer for a strategy, `None` when the strategy is not signed here
    pub fn get(&self, strategy: SendStrategy) -> Option<&Arc<dyn SignTransactionUseCase>> {
        match strategy {
            SendStrategy::Public => Some(&self.transaction),
            SendStrategy::EeaPrivate => Some(&self.eea_transaction),
            SendStrategy::TesseraMarking => Some(&self.tessera_marking),
            SendStrategy::Raw | SendStrategy::TesseraPrivate => None,
        }
    }
}

pub struct SignProcessor {
    signers: SignUseCases,
    emitter: EnvelopeEmitter,
    updater: JobStatusUpdater,
    backoff: ExponentialBackoff,
    sender_topic: String,
    recover_topic: String,
    store_id: String,
}

impl SignProcessor {
    pub fn new(
        signers: SignUseCases,
        emitter: EnvelopeEmitter,
        updater: JobStatusUpdater,
        backoff: ExponentialBackoff,
        sender_topic: impl Into<String>,
        recover_topic: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Self {
        Self {
            signers,
            emitter,
            updater,
            backoff,
            sender_topic: sender_topic.into(),
            recover_topic: recover_topic.into(),
            store_id: store_id.into(),
        }
    }

    /// Build from configuration; fails when the sender topic is also the input topic
    pub fn from_config(
        config: &PipelineConfig,
        signers: SignUseCases,
        emitter: EnvelopeEmitter,
        updater: JobStatusUpdater,
    ) -> ConfigResult<Self> {
        config.validate_sign_stage()?;
        Ok(Self::new(
            signers,
            emitter,
            updater,
            ExponentialBackoff::from(&config.backoff),
            config.kafka.sender_topic.clone(),
            config.kafka.recover_topic.clone(),
            config.listener.key_store_name.clone(),
        ))
    }
}

#[async_trait]
impl EnvelopeProcessor for SignProcessor {
    fn component(&self) -> &'static str {
        components::SIGN_PROCESSOR
    }

    async fn process(&self, ctx: &JobContext, envelope: Envelope) -> PipelineResult<()> {
        let mut attempt = SignAttempt {
            processor: self,
            ctx,
            envelope,
        };

        retry_notify(&self.backoff, ctx.cancellation(), &mut attempt, |error, wait| {
            warn!(error = %error, retry_in = ?wait, "error signing job, retrying");
        })
        .await
        .map_err(|e| e.extend_component(components::SIGN_PROCESSOR))
    }
}

struct SignAttempt<'a> {
    processor: &'a SignProcessor,
    ctx: &'a JobContext,
    envelope: Envelope,
}

impl SignAttempt<'_> {
    /// Sign the transaction according to the job type and write the result onto the
    /// envelope
    async fn sign(&mut self) -> PipelineResult<()> {
        let job = Job::from_envelope(&self.envelope, &self.processor.store_id);
        let strategy = job.parsed_type()?.strategy();

        let signed = match self.processor.signers.get(strategy) {
            Some(signer) => signer.execute(self.ctx, &job).await?,
            None if strategy == SendStrategy::Raw => {
                info!(job_uuid = %job.uuid, "raw transaction processed successfully");
                return Ok(());
            }
            // Tessera stores the payload itself, nothing to sign
            None => {
                info!(job_uuid = %job.uuid, "tessera transaction processed successfully");
                SignedTransaction {
                    raw: String::new(),
                    tx_hash: String::new(),
                }
            }
        };

        debug!(job_uuid = %job.uuid, strategy = ?strategy, "transaction signed");
        self.envelope.set_raw(signed.raw);
        self.envelope.set_tx_hash(&signed.tx_hash)
    }

    async fn recover(&mut self, cause: &PipelineError) -> PipelineResult<()> {
        self.envelope.append_error(cause.to_coded());
        self.processor
            .emitter
            .recover(self.ctx, &self.envelope, &self.processor.recover_topic)
            .await?;
        self.processor
            .updater
            .update(
                self.ctx,
                self.envelope.job_uuid(),
                JobStatus::Failed,
                &cause.to_string(),
                None,
            )
            .await?;
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
impl Retryable for SignAttempt<'_> {
    type Output = ();

    async fn attempt(&mut self) -> Result<(), RetryError> {
        let error = match self.sign().await {
            Ok(()) => {
                let forwarded = self
                    .processor
                    .emitter
                    .forward(self.ctx, &self.envelope, &self.processor.sender_topic)
                    .await;
                return forwarded.map(|_| ()).map_err(|e| self.follow_up_failed(e));
            }
            Err(error) => error,
        };

        match classify_error(&error) {
            ErrorClass::Context => return Err(RetryError::Permanent(error)),
            _ if self.ctx.is_cancelled() => {
                return Err(RetryError::Permanent(PipelineError::Canceled))
            }
            ErrorClass::Connection => return Err(RetryError::Transient(error)),
            ErrorClass::InvalidNonce | ErrorClass::Terminal => {}
        }

        let recovered = self.recover(&error).await;
        recovered.map_err(|e| self.follow_up_failed(e))
    }
}
