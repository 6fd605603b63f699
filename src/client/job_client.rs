//! Job-registry client contract.

use super::context::JobContext;
use crate::error::PipelineResult;
use crate::models::EthTransaction;
use crate::state_machine::JobStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction fields the pipeline may write back onto a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub nonce: Option<u64>,
    pub hash: Option<String>,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateJobRequest {
    pub status: JobStatus,
    pub message: String,
    pub transaction: Option<TransactionPatch>,
}

impl UpdateJobRequest {
    pub fn new(status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            transaction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub uuid: String,
    pub schedule_uuid: String,
    pub chain_uuid: String,
    pub job_type: String,
    pub status: JobStatus,
    pub transaction: EthTransaction,
    pub updated_at: DateTime<Utc>,
}

/// Remote job registry
///
/// Implementations reject writes over a terminal job with an `INVALID_PARAMETER` or
/// `INVALID_STATE` class error and report transport failures as connection errors.
#[async_trait]
pub trait JobClient: Send + Sync {
    async fn get_job(&self, ctx: &JobContext, job_uuid: &str) -> PipelineResult<JobResponse>;

    async fn update_job(
        &self,
        ctx: &JobContext,
        job_uuid: &str,
        request: &UpdateJobRequest,
    ) -> PipelineResult<JobResponse>;
}
