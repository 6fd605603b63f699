//! # Job-Registry Client
//!
//! Contract for the remote job registry, the per-message call context forwarded into
//! every remote call, and an in-memory registry.

pub mod context;
pub mod in_memory;
pub mod job_client;

pub use context::JobContext;
pub use in_memory::{InMemoryJobClient, RegistryCall};
pub use job_client::{JobClient, JobResponse, TransactionPatch, UpdateJobRequest};
