// Job status model shared with the job registry.

pub mod states;

pub use states::JobStatus;
