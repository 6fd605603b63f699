//! # Job Model
//!
//! Normalised projection of an [`Envelope`] consumed by the send and sign use cases.

use super::transaction::EthTransaction;
use crate::constants::headers;
use crate::error::{PipelineError, PipelineResult};
use crate::messaging::Envelope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of transaction kinds a job may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    EthTransaction,
    EthRawTransaction,
    OrionMarkingTransaction,
    OrionEeaTransaction,
    TesseraMarkingTransaction,
    TesseraPrivateTransaction,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::EthTransaction,
        JobType::EthRawTransaction,
        JobType::OrionMarkingTransaction,
        JobType::OrionEeaTransaction,
        JobType::TesseraMarkingTransaction,
        JobType::TesseraPrivateTransaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EthTransaction => "eth://ethereum/transaction",
            Self::EthRawTransaction => "eth://ethereum/rawTransaction",
            Self::OrionMarkingTransaction => "eth://orion/markingTransaction",
            Self::OrionEeaTransaction => "eth://orion/eeaTransaction",
            Self::TesseraMarkingTransaction => "eth://tessera/markingTransaction",
            Self::TesseraPrivateTransaction => "eth://tessera/privateTransaction",
        }
    }

    /// Send strategy responsible for this job type
    pub fn strategy(&self) -> SendStrategy {
        match self {
            Self::EthRawTransaction => SendStrategy::Raw,
            Self::EthTransaction | Self::OrionMarkingTransaction => SendStrategy::Public,
            Self::OrionEeaTransaction => SendStrategy::EeaPrivate,
            Self::TesseraMarkingTransaction => SendStrategy::TesseraMarking,
            Self::TesseraPrivateTransaction => SendStrategy::TesseraPrivate,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PipelineError::invalid_parameter(format!("job type {s} is not supported")))
    }
}

/// Send/sign strategy selected for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendStrategy {
    Raw,
    Public,
    EeaPrivate,
    TesseraMarking,
    TesseraPrivate,
}

/// Processing metadata attached to a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalData {
    pub chain_id: String,
    pub one_time_key: bool,
    pub parent_job_uuid: String,
    pub priority: String,
    /// Signing store the job's keys live in
    pub store_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub uuid: String,
    pub next_job_uuid: String,
    pub schedule_uuid: String,
    pub chain_uuid: String,
    /// Wire job type; validated when the job is dispatched
    pub job_type: String,
    pub tenant_id: String,
    pub internal_data: InternalData,
    pub transaction: EthTransaction,
}

impl Job {
    /// Build the job view of an envelope
    pub fn from_envelope(envelope: &Envelope, store_id: &str) -> Self {
        Self {
            uuid: envelope.job_uuid().to_string(),
            next_job_uuid: envelope.next_job_uuid().to_string(),
            schedule_uuid: envelope.schedule_uuid().to_string(),
            chain_uuid: envelope.chain_uuid().to_string(),
            job_type: envelope.job_type.clone(),
            tenant_id: envelope.header(headers::TENANT_ID).to_string(),
            internal_data: InternalData {
                chain_id: envelope.chain_id().to_string(),
                one_time_key: envelope.one_time_key(),
                parent_job_uuid: envelope.parent_job_uuid().to_string(),
                priority: envelope.priority().to_string(),
                store_id: store_id.to_string(),
            },
            transaction: envelope.tx.clone(),
        }
    }

    pub fn parsed_type(&self) -> PipelineResult<JobType> {
        self.job_type.parse()
    }

    /// A job whose parent linkage points at itself is a resend child; children never retry
    pub fn is_child(&self) -> bool {
        !self.uuid.is_empty() && self.internal_data.parent_job_uuid == self.uuid
    }
}
