// src/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-assigned job identifier, unique within one [`crate::dag::Scheduler`].
pub type JobId = u64;

/// Lifecycle status of a job.
///
/// - `Waiting`: not yet dispatched (or interrupted and waiting to resume).
/// - `Running`: dispatched in the current wave.
/// - `Completed`: the body returned without error on some attempt.
/// - `Failed`: every permitted attempt failed, or the job had no runnable body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Waiting,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
