// src/dag/readiness.rs

//! Dependency satisfaction checks.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::job::Job;
use crate::types::{JobId, JobStatus};

/// A read-only view over the scheduler's jobs, indexed by id.
///
/// Built once per readiness scan so each dependency lookup is O(1).
pub struct ReadinessView<'a> {
    jobs: HashMap<JobId, &'a Job>,
    /// Ids of jobs completed in an earlier process and carried over from a
    /// loaded state document.
    archived: HashSet<JobId>,
}

impl<'a> ReadinessView<'a> {
    pub fn new(jobs: &'a [Job], archived: impl IntoIterator<Item = JobId>) -> Self {
        Self {
            jobs: jobs.iter().map(|job| (job.id(), job)).collect(),
            archived: archived.into_iter().collect(),
        }
    }

    /// Whether `id` counts as a completed dependency.
    ///
    /// A live job decides by its status; an archived id is completed; any
    /// other id is unknown and never satisfied.
    pub fn is_completed(&self, id: JobId) -> bool {
        match self.jobs.get(&id) {
            Some(job) => job.status() == JobStatus::Completed,
            None => self.archived.contains(&id),
        }
    }

    /// A job can start iff it is still `Waiting` and every dependency is
    /// completed. Failed jobs are terminal and never re-dispatched.
    pub fn can_start(&self, job: &Job) -> bool {
        if job.status() != JobStatus::Waiting {
            return false;
        }

        for &dep in job.dependencies() {
            if !self.is_completed(dep) {
                trace!(job = job.id(), dep, "dependency not completed yet");
                return false;
            }
        }

        true
    }
}
