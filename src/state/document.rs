// src/state/document.rs

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{JobwaveError, Result};
use crate::job::{Job, JobBody};
use crate::types::{JobId, JobStatus};

/// Persisted scheduler state.
///
/// ```json
/// {
///   "capacity": 10,
///   "jobs": [
///     {
///       "id": 1,
///       "workDelay": 5.0,
///       "preDelay": null,
///       "attemptsUsed": 1,
///       "maxAttempts": 1,
///       "dependencies": [],
///       "status": "completed",
///       "body": { "handler": "create_dir", "args": { "path": "out" } }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub capacity: usize,
    pub jobs: Vec<JobRecord>,
}

/// One job as stored in a [`StateDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,
    #[serde(default, with = "opt_secs")]
    pub work_delay: Option<Duration>,
    #[serde(default, with = "opt_secs")]
    pub pre_delay: Option<Duration>,
    pub attempts_used: u32,
    pub max_attempts: u32,
    #[serde(default)]
    pub dependencies: Vec<JobId>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JobBody>,
}

impl JobRecord {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id(),
            work_delay: job.work_delay(),
            pre_delay: job.pre_delay(),
            attempts_used: job.attempts_used(),
            max_attempts: job.max_attempts(),
            dependencies: job.dependencies().to_vec(),
            status: job.status(),
            body: job.body().cloned(),
        }
    }

    /// Status a resumed job should start from.
    ///
    /// - `running` means the process died mid-run: resume as `waiting`.
    /// - `failed` with attempts left (e.g. it had no body) gets to use them.
    pub fn resume_status(&self) -> JobStatus {
        match self.status {
            JobStatus::Running => JobStatus::Waiting,
            JobStatus::Failed if self.attempts_used < self.max_attempts => JobStatus::Waiting,
            other => other,
        }
    }

    /// Build a fresh job from this record (no live counterpart exists).
    pub fn to_job(&self) -> Job {
        let mut job = match &self.body {
            Some(body) => Job::new(self.id, body.clone()),
            None => Job::placeholder(self.id),
        }
        .with_max_attempts(self.max_attempts);

        job.restore_from(
            self.resume_status(),
            self.attempts_used,
            self.pre_delay,
            self.work_delay,
            self.dependencies.clone(),
        );
        job
    }
}

impl StateDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: StateDocument = serde_json::from_str(json)
            .map_err(|e| JobwaveError::CorruptState(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| JobwaveError::Other(anyhow::Error::from(e)))
    }

    /// Structural checks that serde cannot express.
    ///
    /// - ids are unique
    /// - `attemptsUsed <= maxAttempts`
    /// - every dependency id names a record in this document
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.jobs.len());
        for record in &self.jobs {
            if !ids.insert(record.id) {
                return Err(JobwaveError::CorruptState(format!(
                    "job {} appears more than once",
                    record.id
                )));
            }
            if record.attempts_used > record.max_attempts {
                return Err(JobwaveError::CorruptState(format!(
                    "job {} used {} attempts but allows only {}",
                    record.id, record.attempts_used, record.max_attempts
                )));
            }
        }

        for record in &self.jobs {
            if let Some(&missing) = record.dependencies.iter().find(|dep| !ids.contains(*dep)) {
                return Err(JobwaveError::UnknownDependency {
                    job: record.id,
                    dependency: missing,
                });
            }
        }

        Ok(())
    }
}

/// `Option<Duration>` as fractional seconds or `null`.
mod opt_secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => ser.serialize_f64(d.as_secs_f64()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(de)? {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid delay {secs}: {e}"))),
            None => Ok(None),
        }
    }
}
