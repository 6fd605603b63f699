//! # Job-Status Updater
//!
//! Writes status transitions to the job registry without ever overriding a terminal
//! status. `Failed` and `Recovering` writes read the current status first; a write the
//! registry rejects because the job went terminal in the meantime is also reported as
//! skipped.

use crate::client::{JobClient, JobContext, TransactionPatch, UpdateJobRequest};
use crate::constants::components;
use crate::error::PipelineResult;
use crate::logging::log_job_operation;
use crate::state_machine::JobStatus;
use std::sync::Arc;
use tracing::{error, warn};

/// Result of a status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdateOutcome {
    Applied(JobStatus),
    /// The job was already terminal; nothing was written
    Skipped { current: JobStatus },
}

impl StatusUpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Clone)]
pub struct JobStatusUpdater {
    client: Arc<dyn JobClient>,
}

impl JobStatusUpdater {
    pub fn new(client: Arc<dyn JobClient>) -> Self {
        Self { client }
    }

    pub async fn update(
        &self,
        ctx: &JobContext,
        job_uuid: &str,
        status: JobStatus,
        message: &str,
        transaction: Option<TransactionPatch>,
    ) -> PipelineResult<StatusUpdateOutcome> {
        if matches!(status, JobStatus::Failed | JobStatus::Recovering) {
            if let Some(current) = self.terminal_status(ctx, job_uuid).await? {
                warn!(
                    job_uuid = %job_uuid,
                    current = %current,
                    requested = %status,
                    "job already in terminal status, skipping update"
                );
                log_job_operation("update_status", job_uuid, &current.to_string(), Some("skipped"));
                return Ok(StatusUpdateOutcome::Skipped { current });
            }
        }

        let request = UpdateJobRequest {
            status,
            message: message.to_string(),
            transaction,
        };

        match self.client.update_job(ctx, job_uuid, &request).await {
            Ok(_) => {
                log_job_operation("update_status", job_uuid, &status.to_string(), Some(message));
                Ok(StatusUpdateOutcome::Applied(status))
            }
            Err(e) if e.is_invalid_parameter() || e.is_invalid_state() => {
                // The registry refuses writes over terminal jobs
                if let Some(current) = self.terminal_status(ctx, job_uuid).await? {
                    warn!(job_uuid = %job_uuid, current = %current, error = %e, "ignored error");
                    return Ok(StatusUpdateOutcome::Skipped { current });
                }
                error!(job_uuid = %job_uuid, status = %status, error = %e, "failed to update job status");
                Err(e.extend_component(components::JOB_STATUS_UPDATER))
            }
            Err(e) => {
                error!(job_uuid = %job_uuid, status = %status, error = %e, "failed to update job status");
                Err(e.extend_component(components::JOB_STATUS_UPDATER))
            }
        }
    }

    async fn terminal_status(
        &self,
        ctx: &JobContext,
        job_uuid: &str,
    ) -> PipelineResult<Option<JobStatus>> {
        let job = self
            .client
            .get_job(ctx, job_uuid)
            .await
            .map_err(|e| e.extend_component(components::JOB_STATUS_UPDATER))?;
        Ok(job.status.is_terminal().then_some(job.status))
    }
}
