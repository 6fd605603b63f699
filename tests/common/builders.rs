use bytes::Bytes;
use txsender_core::constants::{headers, labels};
use txsender_core::messaging::{encode_request, Envelope};
use txsender_core::models::JobType;

pub const FROM: &str = "0x7e654d251da770a068413677967f6d3ea2fea9e4";
pub const OTHER_FROM: &str = "0x93f7274c9059e601be4512f656b57b830e019e41";
pub const TX_HASH: &str = "0x0a0cafa26ca3f411e6629e9e02c53f23713b0033d7a72e534136104b5447a210";
pub const CHAIN_ID: &str = "888";

/// Fluent builder for test envelopes
pub struct EnvelopeBuilder {
    envelope: Envelope,
}

impl EnvelopeBuilder {
    pub fn new(job_uuid: &str, job_type: JobType) -> Self {
        let mut envelope = Envelope::new(format!("envelope-{job_uuid}"));
        envelope.job_type = job_type.as_str().to_string();
        envelope.chain_name = "besu".to_string();
        envelope
            .set_internal_label(labels::JOB_UUID, job_uuid)
            .set_internal_label(labels::SCHEDULE_UUID, "schedule-1")
            .set_internal_label(labels::CHAIN_ID, CHAIN_ID)
            .set_internal_label(labels::CHAIN_UUID, "chain-1")
            .set_header(headers::TENANT_ID, "tenant-a");
        envelope.tx.from = Some(FROM.to_string());
        envelope.tx.to = Some(OTHER_FROM.to_string());
        envelope.tx.gas = Some(21_000);
        envelope.tx.value = Some("1000".to_string());
        Self { envelope }
    }

    pub fn with_job_type(mut self, job_type: &str) -> Self {
        self.envelope.job_type = job_type.to_string();
        self
    }

    pub fn from(mut self, from: &str) -> Self {
        self.envelope.tx.from = Some(from.to_string());
        self
    }

    /// Mark the job as a resend child (parent linkage pointing at itself)
    pub fn child(mut self) -> Self {
        let uuid = self.envelope.job_uuid().to_string();
        self.envelope.set_internal_label(labels::PARENT_JOB_UUID, uuid);
        self
    }

    /// Populate nonce, raw and hash as left by a previous send
    pub fn sent(mut self) -> Self {
        self.envelope.tx.nonce = Some(42);
        self.envelope.set_raw("0xf86c2a8504a817c800");
        let _ = self.envelope.set_tx_hash(TX_HASH);
        self
    }

    pub fn raw(mut self, raw: &str) -> Self {
        self.envelope.set_raw(raw);
        self
    }

    pub fn authorization(mut self, value: &str) -> Self {
        self.envelope.set_header(headers::AUTHORIZATION, value);
        self
    }

    pub fn build(self) -> Envelope {
        self.envelope
    }

    pub fn encode(self) -> Bytes {
        encode_request(&self.envelope)
    }
}
