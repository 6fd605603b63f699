//! # Orchestration
//!
//! The transaction pipeline proper: error classification, job dispatch, envelope
//! emission, job-status propagation, the send and sign processors and the message
//! listener that drives them per claimed partition.

pub mod dispatcher;
pub mod envelope_emitter;
pub mod error_classifier;
pub mod job_status_updater;
pub mod message_listener;
pub mod send_processor;
pub mod sign_processor;

pub use dispatcher::{JobDispatcher, SendTxUseCase, SendUseCases};
pub use envelope_emitter::{EnvelopeEmitter, EnvelopeForm};
pub use error_classifier::{classify_error, classify_follow_up, ErrorClass};
pub use job_status_updater::{JobStatusUpdater, StatusUpdateOutcome};
pub use message_listener::{EnvelopeProcessor, MessageListener};
pub use send_processor::SendProcessor;
pub use sign_processor::{SignProcessor, SignTransactionUseCase, SignUseCases, SignedTransaction};
