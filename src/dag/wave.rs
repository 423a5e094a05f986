// src/dag/wave.rs

//! Result types describing what a `run_all` call did.

use crate::types::JobId;

/// One bounded batch of jobs dispatched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    /// 1-based position of this wave within the run.
    pub index: usize,
    /// Dispatched job ids, in insertion order.
    pub jobs: Vec<JobId>,
}

/// Summary of a finished `run_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub waves: Vec<Wave>,
    pub completed: Vec<JobId>,
    pub failed: Vec<JobId>,
    /// Jobs still waiting because their dependencies can never complete.
    pub stalled: Vec<JobId>,
}

impl RunReport {
    /// Index of the wave `id` ran in, if it ran during this call.
    pub fn wave_of(&self, id: JobId) -> Option<usize> {
        self.waves
            .iter()
            .find(|wave| wave.jobs.contains(&id))
            .map(|wave| wave.index)
    }

    /// Dispatched job ids per wave, handy for assertions.
    pub fn wave_ids(&self) -> Vec<Vec<JobId>> {
        self.waves.iter().map(|wave| wave.jobs.clone()).collect()
    }

    /// True when every job ended completed.
    pub fn all_completed(&self) -> bool {
        self.failed.is_empty() && self.stalled.is_empty()
    }
}
