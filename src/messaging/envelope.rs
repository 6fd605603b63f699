//! # Envelope
//!
//! Wire-level unit of work: a transaction payload plus headers, labels and the errors
//! accumulated while it traversed the pipeline. Envelopes are decoded once per
//! delivery, mutated in place and re-encoded when forwarded or recovered.

use crate::constants::{headers, labels};
use crate::error::{CodedError, PipelineResult};
use crate::models::{normalize_hash, EthTransaction, JobType};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub id: String,
    pub headers: HashMap<String, String>,
    pub context_labels: HashMap<String, String>,
    pub internal_labels: HashMap<String, String>,
    pub job_type: String,
    pub chain_name: String,
    pub tx: EthTransaction,
    pub errors: Vec<CodedError>,
}

fn lookup<'a>(map: &'a HashMap<String, String>, key: &str) -> &'a str {
    map.get(key).map(String::as_str).unwrap_or_default()
}

impl Envelope {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn header(&self, key: &str) -> &str {
        lookup(&self.headers, key)
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn internal_label(&self, key: &str) -> &str {
        lookup(&self.internal_labels, key)
    }

    pub fn set_internal_label(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.internal_labels.insert(key.into(), value.into());
        self
    }

    pub fn context_label(&self, key: &str) -> &str {
        lookup(&self.context_labels, key)
    }

    pub fn set_context_label(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.context_labels.insert(key.into(), value.into());
        self
    }

    pub fn job_uuid(&self) -> &str {
        self.internal_label(labels::JOB_UUID)
    }

    pub fn schedule_uuid(&self) -> &str {
        self.internal_label(labels::SCHEDULE_UUID)
    }

    pub fn chain_id(&self) -> &str {
        self.internal_label(labels::CHAIN_ID)
    }

    pub fn chain_uuid(&self) -> &str {
        self.internal_label(labels::CHAIN_UUID)
    }

    pub fn parent_job_uuid(&self) -> &str {
        self.internal_label(labels::PARENT_JOB_UUID)
    }

    pub fn one_time_key(&self) -> bool {
        self.internal_label(labels::ONE_TIME_KEY) == "true"
    }

    pub fn next_job_uuid(&self) -> &str {
        self.context_label(labels::NEXT_JOB_UUID)
    }

    pub fn priority(&self) -> &str {
        self.context_label(labels::PRIORITY)
    }

    pub fn tenant_id(&self) -> &str {
        self.header(headers::TENANT_ID)
    }

    pub fn username(&self) -> &str {
        self.header(headers::USERNAME)
    }

    /// `Authorization` header, only when it carries a bearer token
    pub fn bearer_authorization(&self) -> Option<&str> {
        let value = self.header(headers::AUTHORIZATION);
        value.starts_with(headers::BEARER_PREFIX).then_some(value)
    }

    pub fn is_job_type(&self, job_type: JobType) -> bool {
        self.job_type == job_type.as_str()
    }

    /// Ordering key for every message belonging to the same sender account
    ///
    /// Empty when the transaction is signed with a one-time key or has no sender, in
    /// which case the transport is free to pick any partition.
    pub fn partition_key(&self) -> String {
        if self.one_time_key() {
            return String::new();
        }
        let Some(from) = self.tx.from.as_deref().filter(|f| !f.is_empty()) else {
            return String::new();
        };
        let chain_id = self.chain_id();

        if self.is_job_type(JobType::OrionEeaTransaction) {
            let group = match self.tx.privacy_group_id.as_deref() {
                Some(group) if !group.is_empty() => group.to_string(),
                _ => {
                    let mut private_for = self.tx.private_for.clone();
                    private_for.sort();
                    private_for.join("-")
                }
            };
            return format!("{from}@orion-{group}@{chain_id}");
        }

        format!("{from}@{chain_id}")
    }

    pub fn append_error(&mut self, error: CodedError) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Clear nonce, hash and raw so the transaction is rebuilt on the next attempt
    pub fn reset_transaction(&mut self) {
        self.tx.reset();
        self.internal_labels.remove(labels::TX_HASH);
    }

    pub fn set_raw(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        self.tx.raw = (!raw.is_empty()).then_some(raw);
    }

    pub fn set_tx_hash(&mut self, hash: &str) -> PipelineResult<()> {
        if hash.is_empty() {
            self.tx.hash = None;
            return Ok(());
        }
        self.tx.hash = Some(normalize_hash(hash)?);
        Ok(())
    }
}
