use serde::{Deserialize, Serialize};
use std::fmt;

/// Job status as tracked by the job registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job accepted by the registry, not yet sent
    Stored,
    /// Transaction submitted, waiting to be mined
    Pending,
    /// Transaction is being re-sent after a nonce reset
    Recovering,
    /// Transaction included in a block
    Mined,
    /// Job failed permanently
    Failed,
    /// Transaction was dropped before being mined
    NeverMined,
}

impl JobStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Mined | Self::Failed | Self::NeverMined)
    }

    /// Whether the registry may move a job from `self` to `next`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        !matches!(next, Self::Stored)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => write!(f, "STORED"),
            Self::Pending => write!(f, "PENDING"),
            Self::Recovering => write!(f, "RECOVERING"),
            Self::Mined => write!(f, "MINED"),
            Self::Failed => write!(f, "FAILED"),
            Self::NeverMined => write!(f, "NEVER_MINED"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STORED" => Ok(Self::Stored),
            "PENDING" => Ok(Self::Pending),
            "RECOVERING" => Ok(Self::Recovering),
            "MINED" => Ok(Self::Mined),
            "FAILED" => Ok(Self::Failed),
            "NEVER_MINED" => Ok(Self::NeverMined),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}
