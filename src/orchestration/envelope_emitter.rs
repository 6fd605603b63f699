//! Envelope emission to the sender and recover topics.

use crate::client::JobContext;
use crate::constants::components;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::log_envelope_emission;
use crate::messaging::{encode_request, encode_response, Envelope, MessageProducer, ProducerMessage};
use std::sync::Arc;
use tracing::{debug, error};

/// Wire form an envelope is published in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeForm {
    /// Consumed by the next pipeline stage
    Request,
    /// Carries accumulated errors for remediation
    Response,
}

/// Publishes envelopes keyed by their partition key
#[derive(Clone)]
pub struct EnvelopeEmitter {
    producer: Arc<dyn MessageProducer>,
}

impl EnvelopeEmitter {
    pub fn new(producer: Arc<dyn MessageProducer>) -> Self {
        Self { producer }
    }

    /// Forward an envelope to the next stage as a request
    pub async fn forward(
        &self,
        ctx: &JobContext,
        envelope: &Envelope,
        topic: &str,
    ) -> PipelineResult<(i32, i64)> {
        self.emit(ctx, envelope, topic, EnvelopeForm::Request).await
    }

    /// Publish an error-annotated envelope to the recover topic
    pub async fn recover(
        &self,
        ctx: &JobContext,
        envelope: &Envelope,
        topic: &str,
    ) -> PipelineResult<(i32, i64)> {
        self.emit(ctx, envelope, topic, EnvelopeForm::Response).await
    }

    pub async fn emit(
        &self,
        ctx: &JobContext,
        envelope: &Envelope,
        topic: &str,
        form: EnvelopeForm,
    ) -> PipelineResult<(i32, i64)> {
        debug!(topic = %topic, envelope_id = %envelope.id, form = ?form, "Sending envelope");

        let payload = match form {
            EnvelopeForm::Request => encode_request(envelope),
            EnvelopeForm::Response => encode_response(envelope),
        };
        let message = ProducerMessage::new(topic, envelope.partition_key(), payload);
        let key = message.key.clone();

        let (partition, offset) = ctx
            .guard(self.producer.send_message(message))
            .await
            .map_err(|e| {
                if e.is_context_error() {
                    return e;
                }
                error!(topic = %topic, envelope_id = %envelope.id, error = %e, "failed to produce kafka message");
                PipelineError::kafka_connection(format!("failed to produce kafka message: {e}"))
                    .extend_component(components::ENVELOPE_EMITTER)
            })?;

        log_envelope_emission(topic, envelope.job_uuid(), key.as_deref(), partition, offset);
        Ok((partition, offset))
    }
}
