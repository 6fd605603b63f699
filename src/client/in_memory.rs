//! # In-Memory Job Registry
//!
//! [`JobClient`] backed by a concurrent map. Mirrors the registry's observable
//! behaviour: writes over a terminal job are rejected with `INVALID_PARAMETER`,
//! unknown jobs yield `NOT_FOUND`, and every status write is appended to the job's
//! history. Calls are recorded and failures can be injected for tests.

use super::context::JobContext;
use super::job_client::{JobClient, JobResponse, UpdateJobRequest};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{EthTransaction, Job};
use crate::state_machine::JobStatus;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Call received by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    GetJob { job_uuid: String },
    UpdateJob { job_uuid: String, request: UpdateJobRequest },
}

#[derive(Debug, Clone)]
struct JobRecord {
    response: JobResponse,
    history: Vec<JobStatus>,
}

#[derive(Debug, Default)]
pub struct InMemoryJobClient {
    jobs: DashMap<String, JobRecord>,
    calls: Mutex<Vec<RegistryCall>>,
    get_faults: Mutex<VecDeque<PipelineError>>,
    update_faults: Mutex<VecDeque<PipelineError>>,
}

impl InMemoryJobClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job in the given status
    pub fn insert_job(&self, job: &Job, status: JobStatus) {
        let response = JobResponse {
            uuid: job.uuid.clone(),
            schedule_uuid: job.schedule_uuid.clone(),
            chain_uuid: job.chain_uuid.clone(),
            job_type: job.job_type.clone(),
            status,
            transaction: job.transaction.clone(),
            updated_at: Utc::now(),
        };
        self.jobs.insert(
            job.uuid.clone(),
            JobRecord {
                response,
                history: vec![status],
            },
        );
    }

    /// Register a bare job by UUID
    pub fn insert_status(&self, job_uuid: &str, status: JobStatus) {
        let job = Job {
            uuid: job_uuid.to_string(),
            ..Default::default()
        };
        self.insert_job(&job, status);
    }

    /// Overwrite a job's status out of band, as a concurrent worker would
    pub fn force_status(&self, job_uuid: &str, status: JobStatus) {
        if let Some(mut record) = self.jobs.get_mut(job_uuid) {
            record.response.status = status;
            record.response.updated_at = Utc::now();
            record.history.push(status);
        }
    }

    pub fn status(&self, job_uuid: &str) -> Option<JobStatus> {
        self.jobs.get(job_uuid).map(|r| r.response.status)
    }

    /// Every status the job went through, starting with its initial one
    pub fn history(&self, job_uuid: &str) -> Vec<JobStatus> {
        self.jobs
            .get(job_uuid)
            .map(|r| r.history.clone())
            .unwrap_or_default()
    }

    pub fn transaction(&self, job_uuid: &str) -> Option<EthTransaction> {
        self.jobs.get(job_uuid).map(|r| r.response.transaction.clone())
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().clone()
    }

    /// Status updates received, in order, including rejected ones
    pub fn update_calls(&self) -> Vec<(String, UpdateJobRequest)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RegistryCall::UpdateJob { job_uuid, request } => {
                    Some((job_uuid.clone(), request.clone()))
                }
                RegistryCall::GetJob { .. } => None,
            })
            .collect()
    }

    pub fn fail_next_gets(&self, count: usize, error: PipelineError) {
        let mut faults = self.get_faults.lock();
        faults.extend(std::iter::repeat(error).take(count));
    }

    pub fn fail_next_updates(&self, count: usize, error: PipelineError) {
        let mut faults = self.update_faults.lock();
        faults.extend(std::iter::repeat(error).take(count));
    }

    fn not_found(job_uuid: &str) -> PipelineError {
        PipelineError::not_found(format!("job {job_uuid} not found"))
    }
}

#[async_trait]
impl JobClient for InMemoryJobClient {
    async fn get_job(&self, ctx: &JobContext, job_uuid: &str) -> PipelineResult<JobResponse> {
        ctx.guard(async {
            self.calls.lock().push(RegistryCall::GetJob {
                job_uuid: job_uuid.to_string(),
            });
            if let Some(error) = self.get_faults.lock().pop_front() {
                return Err(error);
            }

            self.jobs
                .get(job_uuid)
                .map(|r| r.response.clone())
                .ok_or_else(|| Self::not_found(job_uuid))
        })
        .await
    }

    async fn update_job(
        &self,
        ctx: &JobContext,
        job_uuid: &str,
        request: &UpdateJobRequest,
    ) -> PipelineResult<JobResponse> {
        ctx.guard(async {
            self.calls.lock().push(RegistryCall::UpdateJob {
                job_uuid: job_uuid.to_string(),
                request: request.clone(),
            });
            if let Some(error) = self.update_faults.lock().pop_front() {
                return Err(error);
            }

            let mut record = self
                .jobs
                .get_mut(job_uuid)
                .ok_or_else(|| Self::not_found(job_uuid))?;

            let current = record.response.status;
            if !current.can_transition_to(request.status) {
                return Err(PipelineError::invalid_parameter(format!(
                    "cannot update job {job_uuid} from status {current} to {}",
                    request.status
                )));
            }

            record.response.status = request.status;
            record.response.updated_at = Utc::now();
            if let Some(patch) = &request.transaction {
                let tx = &mut record.response.transaction;
                if patch.nonce.is_some() {
                    tx.nonce = patch.nonce;
                }
                if patch.hash.is_some() {
                    tx.hash = patch.hash.clone();
                }
                if patch.raw.is_some() {
                    tx.raw = patch.raw.clone();
                }
            }
            record.history.push(request.status);

            Ok(record.response.clone())
        })
        .await
    }
}
