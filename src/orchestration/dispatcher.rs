//! # Job-Type Dispatcher
//!
//! Routing table from a job's declared type to one of the five send strategies. The
//! dispatcher performs no retries; the caller owns the retry policy.

use crate::client::JobContext;
use crate::constants::components;
use crate::error::PipelineResult;
use crate::models::{Job, SendStrategy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Send use case for one strategy
///
/// Implementations may update the job's transaction (hash, raw) as a side effect.
#[async_trait]
pub trait SendTxUseCase: Send + Sync {
    async fn execute(&self, ctx: &JobContext, job: &mut Job) -> PipelineResult<()>;
}

/// One use case per send strategy
#[derive(Clone)]
pub struct SendUseCases {
    pub raw: Arc<dyn SendTxUseCase>,
    pub public: Arc<dyn SendTxUseCase>,
    pub eea_private: Arc<dyn SendTxUseCase>,
    pub tessera_marking: Arc<dyn SendTxUseCase>,
    pub tessera_private: Arc<dyn SendTxUseCase>,
}

impl SendUseCases {
    pub fn get(&self, strategy: SendStrategy) -> &Arc<dyn SendTxUseCase> {
        match strategy {
            SendStrategy::Raw => &self.raw,
            SendStrategy::Public => &self.public,
            SendStrategy::EeaPrivate => &self.eea_private,
            SendStrategy::TesseraMarking => &self.tessera_marking,
            SendStrategy::TesseraPrivate => &self.tessera_private,
        }
    }
}

pub struct JobDispatcher {
    use_cases: SendUseCases,
}

impl JobDispatcher {
    pub fn new(use_cases: SendUseCases) -> Self {
        Self { use_cases }
    }

    /// Strategy for a job; unknown types are an `INVALID_PARAMETER` error
    pub fn route(&self, job: &Job) -> PipelineResult<SendStrategy> {
        job.parsed_type()
            .map(|job_type| job_type.strategy())
            .map_err(|e| e.extend_component(components::DISPATCHER))
    }

    pub async fn dispatch(&self, ctx: &JobContext, job: &mut Job) -> PipelineResult<()> {
        let strategy = self.route(job)?;
        debug!(job_uuid = %job.uuid, strategy = ?strategy, "Dispatching job");
        self.use_cases.get(strategy).execute(ctx, job).await
    }
}
