// src/state/persist.rs

//! `save` / `load` for [`Scheduler`].
//!
//! Loading merges a document into the scheduler by job id:
//! - a record whose id matches a live job overwrites that job's persisted
//!   fields (delays, attempts used, status, dependencies);
//! - an unfinished record with no live job is reconstructed as a new job;
//! - a completed record with no live job is archived: it is not added to
//!   `jobs`, but its id still satisfies dependencies and it is written back
//!   out by `save`. Records archived by an earlier load are kept unless the
//!   new document has a record with the same id.
//!
//! A load either applies completely or leaves the scheduler untouched.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::dag::Scheduler;
use crate::errors::{JobwaveError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::state::document::{JobRecord, StateDocument};
use crate::types::{JobId, JobStatus};

/// What a load did, by job id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Live jobs updated from the document.
    pub merged: Vec<JobId>,
    /// Unfinished jobs added from the document.
    pub reconstructed: Vec<JobId>,
    /// Completed jobs kept only as archived records.
    pub archived: Vec<JobId>,
}

impl Scheduler {
    /// Current state as a document: live jobs in insertion order, then
    /// archived records.
    pub fn snapshot(&self) -> StateDocument {
        let jobs = self
            .jobs()
            .iter()
            .map(JobRecord::from_job)
            .chain(self.archived().iter().cloned())
            .collect();

        StateDocument {
            capacity: self.capacity(),
            jobs,
        }
    }

    /// Write the current state as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(&RealFileSystem, path)
    }

    pub fn save_with(&self, fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let doc = self.snapshot();
        let json = doc.to_json_pretty()?;
        fs.write(path, json.as_bytes())?;
        info!(path = %path.display(), jobs = doc.jobs.len(), "saved scheduler state");
        Ok(())
    }

    /// Read a state document from `path` and merge it into this scheduler.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadSummary> {
        self.load_with(&RealFileSystem, path)
    }

    pub fn load_with(&mut self, fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        if !fs.exists(path) {
            return Err(JobwaveError::StateFileMissing(path.to_path_buf()));
        }

        let bytes = fs.read(path)?;
        let json = String::from_utf8(bytes)
            .map_err(|e| JobwaveError::CorruptState(format!("not valid UTF-8: {e}")))?;
        let doc = StateDocument::from_json(&json)?;
        let summary = self.restore(doc)?;

        info!(
            path = %path.display(),
            merged = summary.merged.len(),
            reconstructed = summary.reconstructed.len(),
            archived = summary.archived.len(),
            "loaded scheduler state"
        );
        Ok(summary)
    }

    /// Merge an already-parsed document into this scheduler.
    pub fn restore(&mut self, doc: StateDocument) -> Result<LoadSummary> {
        doc.validate()?;

        let mut jobs = self.jobs().to_vec();
        let index: HashMap<JobId, usize> = jobs
            .iter()
            .enumerate()
            .map(|(idx, job)| (job.id(), idx))
            .collect();

        // Earlier archives survive unless this document says otherwise.
        let mut archived: Vec<JobRecord> = self
            .archived()
            .iter()
            .filter(|kept| doc.jobs.iter().all(|record| record.id != kept.id))
            .cloned()
            .collect();
        let mut summary = LoadSummary::default();

        for record in doc.jobs {
            if let Some(&idx) = index.get(&record.id) {
                let job = &mut jobs[idx];
                job.restore_from(
                    record.resume_status(),
                    record.attempts_used,
                    record.pre_delay,
                    record.work_delay,
                    record.dependencies.clone(),
                );
                if job.body().is_none() {
                    if let Some(body) = record.body {
                        job.set_body(body);
                    }
                }
                debug!(job = record.id, status = %job.status(), "merged persisted job");
                summary.merged.push(record.id);
            } else if record.status == JobStatus::Completed {
                debug!(job = record.id, "archived completed job");
                summary.archived.push(record.id);
                archived.push(record);
            } else {
                let job = record.to_job();
                debug!(job = record.id, status = %job.status(), "reconstructed persisted job");
                summary.reconstructed.push(record.id);
                jobs.push(job);
            }
        }

        if jobs.len() > doc.capacity {
            return Err(JobwaveError::CapacityExceeded {
                capacity: doc.capacity,
            });
        }

        self.replace_state(doc.capacity, jobs, archived);
        Ok(summary)
    }
}
