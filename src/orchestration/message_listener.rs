//! # Message Listener
//!
//! Consumer-group handler driving the per-partition claim loop. Every claimed
//! partition is processed strictly sequentially: decode, process under the retry
//! policy, then mark the message consumed.
//!
//! - Undecodable messages are logged and marked; they can never succeed.
//! - Cancellation stops the loop without marking the in-flight message and ends the
//!   claim cleanly.
//! - Any other processing error is fatal for the claim: the message stays unmarked
//!   and the error is returned so the group rebalances and the partition restarts.
//!
//! Each `consume_claim` call builds its own [`ClaimLoop`] and returns its own
//! result. The only state shared across claims is the listener's cancellation
//! token, replaced in `setup` and cancelled in `cleanup`.

use crate::client::JobContext;
use crate::constants::components;
use crate::error::PipelineResult;
use crate::messaging::{
    decode_envelope, ConsumerGroupClaim, ConsumerGroupHandler, ConsumerGroupSession,
    ConsumerMessage, Envelope,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

/// Per-envelope work performed by a listener
#[async_trait]
pub trait EnvelopeProcessor: Send + Sync {
    /// Component name used to tag errors and logs
    fn component(&self) -> &'static str;

    /// Process one decoded envelope to completion, retries included
    ///
    /// `Ok` means the message may be marked consumed.
    async fn process(&self, ctx: &JobContext, envelope: Envelope) -> PipelineResult<()>;
}

pub struct MessageListener<P: EnvelopeProcessor> {
    processor: Arc<P>,
    call_timeout: Option<Duration>,
    cancellation: Mutex<CancellationToken>,
}

impl<P: EnvelopeProcessor> MessageListener<P> {
    pub fn new(processor: Arc<P>) -> Self {
        Self {
            processor,
            call_timeout: None,
            cancellation: Mutex::new(CancellationToken::new()),
        }
    }

    /// Deadline applied to every remote call made while processing a message
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }
}

#[async_trait]
impl<P: EnvelopeProcessor + 'static> ConsumerGroupHandler for MessageListener<P> {
    async fn setup(&self, session: &dyn ConsumerGroupSession) -> PipelineResult<()> {
        *self.cancellation.lock() = session.cancellation().child_token();

        info!(
            generation_id = session.generation_id(),
            member_id = %session.member_id(),
            claims = ?session.claims(),
            component = self.processor.component(),
            "ready to consume messages"
        );
        Ok(())
    }

    async fn cleanup(&self, session: &dyn ConsumerGroupSession) -> PipelineResult<()> {
        info!(generation_id = session.generation_id(), "all claims consumed");

        debug!("canceling context");
        self.cancellation.lock().cancel();
        Ok(())
    }

    async fn consume_claim(
        &self,
        session: &dyn ConsumerGroupSession,
        claim: ConsumerGroupClaim,
    ) -> PipelineResult<()> {
        let cancellation = self.cancellation.lock().child_token();
        let claim_loop = ClaimLoop {
            processor: self.processor.as_ref(),
            session,
            cancellation,
            call_timeout: self.call_timeout,
        };

        claim_loop.run(claim).await
    }
}

/// Processing loop for a single claimed partition
struct ClaimLoop<'a, P: EnvelopeProcessor> {
    processor: &'a P,
    session: &'a dyn ConsumerGroupSession,
    cancellation: CancellationToken,
    call_timeout: Option<Duration>,
}

impl<P: EnvelopeProcessor> ClaimLoop<'_, P> {
    async fn run(self, mut claim: ConsumerGroupClaim) -> PipelineResult<()> {
        info!(
            topic = %claim.topic(),
            partition = claim.partition(),
            initial_offset = claim.initial_offset(),
            "started consuming claims loop"
        );

        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    info!(reason = "context canceled", "gracefully stopping message listener...");
                    return Ok(());
                }
                message = claim.next_message() => match message {
                    Some(message) => message,
                    // Partition revoked
                    None => return Ok(()),
                },
            };

            if !self.handle(&message).await? {
                return Ok(());
            }
        }
    }

    /// Returns `false` when the loop must stop without marking the message
    async fn handle(&self, message: &ConsumerMessage) -> PipelineResult<bool> {
        let envelope = match decode_envelope(&message.value) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "error decoding message"
                );
                self.session.mark_message(message);
                return Ok(true);
            }
        };

        let span = info_span!(
            "process_envelope",
            envelope_id = %envelope.id,
            job_uuid = %envelope.job_uuid(),
            schedule_uuid = %envelope.schedule_uuid(),
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
        );
        debug!(parent: &span, timestamp = %message.timestamp, "message consumed");

        let ctx = JobContext::from_envelope(&envelope, self.cancellation.clone(), self.call_timeout);
        match self.processor.process(&ctx, envelope).instrument(span.clone()).await {
            Ok(()) => {
                debug!(parent: &span, "job processed successfully");
                self.session.mark_message(message);
                Ok(true)
            }
            Err(e) if e.is_context_error() && self.cancellation.is_cancelled() => {
                info!(parent: &span, "processing interrupted by shutdown, message left unmarked");
                Ok(false)
            }
            Err(e) => {
                error!(parent: &span, error = %e, "error processing message");
                Err(e.extend_component(components::MESSAGE_LISTENER))
            }
        }
    }
}
