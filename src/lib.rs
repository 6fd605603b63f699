#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # TxSender Core Rust
//!
//! Message-driven dispatch and retry pipeline for blockchain transaction jobs.
//!
//! ## Overview
//!
//! Transaction envelopes are consumed from a partitioned log, converted into typed
//! jobs, routed to the matching send or sign strategy and retried under a bounded
//! exponential backoff. Failures are classified into retryable and terminal kinds:
//! terminal failures are re-emitted to a recovery topic and the job is failed in the
//! job registry, without ever overriding a status another worker already made
//! terminal.
//!
//! ## Module Organization
//!
//! - [`error`] - Coded error model and component tagging
//! - [`config`] - Configuration loading and validation
//! - [`logging`] - Structured logging setup and helpers
//! - [`models`] - Job and transaction value objects
//! - [`state_machine`] - Job status model
//! - [`messaging`] - Envelope codec, producer and consumer-group contracts, in-memory broker
//! - [`client`] - Job-registry contract and per-message call context
//! - [`resilience`] - Backoff and retry loop
//! - [`orchestration`] - Dispatcher, emitter, status updater, processors and listener
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use txsender_core::client::InMemoryJobClient;
//! use txsender_core::config::PipelineConfig;
//! use txsender_core::messaging::InMemoryBroker;
//! use txsender_core::orchestration::{
//!     EnvelopeEmitter, JobDispatcher, JobStatusUpdater, MessageListener, SendProcessor,
//!     SendUseCases,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(use_cases: SendUseCases) -> txsender_core::PipelineResult<()> {
//! let config = PipelineConfig::default();
//! let broker = InMemoryBroker::new(4);
//! let registry = Arc::new(InMemoryJobClient::new());
//!
//! let processor = SendProcessor::from_config(
//!     &config,
//!     Arc::new(JobDispatcher::new(use_cases)),
//!     EnvelopeEmitter::new(broker.clone()),
//!     JobStatusUpdater::new(registry),
//! );
//! let listener = Arc::new(
//!     MessageListener::new(Arc::new(processor))
//!         .with_call_timeout(config.listener.call_timeout()),
//! );
//!
//! broker
//!     .run_consumer_group(
//!         &config.kafka.consumer_group,
//!         &config.kafka.input_topic,
//!         listener,
//!         CancellationToken::new(),
//!     )
//!     .await
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod resilience;
pub mod state_machine;

pub use config::{ConfigManager, PipelineConfig};
pub use error::{CodedError, ErrorCode, PipelineError, PipelineResult};
pub use logging::init_structured_logging;
pub use messaging::Envelope;
pub use models::{Job, JobType};
pub use state_machine::JobStatus;
