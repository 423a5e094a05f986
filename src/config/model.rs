// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::errors::{JobwaveError, Result};
use crate::job::{Job, JobArgs, JobBody};
use crate::types::JobId;

/// Top-level job graph file as read from TOML.
///
/// ```toml
/// [scheduler]
/// capacity = 10
/// state_file = "tasks_state.json"
///
/// [[job]]
/// id = 1
/// handler = "create_dir"
/// args = { path = "test_directory" }
/// work_delay = 5
///
/// [[job]]
/// id = 2
/// handler = "write_file"
/// args = { path = "test_directory/file1.txt", content = "hello" }
/// after = [1]
/// max_attempts = 2
/// ```
///
/// This is the unvalidated shape; use [`ConfigFile`] (via `TryFrom`) for the
/// rest of the application.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// Jobs in declaration order, which is also their insertion order.
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    jobs: Vec<JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(scheduler: SchedulerSection, jobs: Vec<JobConfig>) -> Self {
        Self { scheduler, jobs }
    }

    pub fn jobs(&self) -> &[JobConfig] {
        &self.jobs
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Maximum number of jobs, and maximum number run concurrently.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Where run state is saved and resumed from.
    #[serde(default)]
    pub state_file: Option<String>,
}

fn default_capacity() -> usize {
    10
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            state_file: None,
        }
    }
}

/// `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub id: JobId,

    /// Name of a registered handler.
    pub handler: String,

    /// Keyword arguments passed to the handler.
    #[serde(default)]
    pub args: JobArgs,

    /// Ids of jobs that must complete first.
    #[serde(default)]
    pub after: Vec<JobId>,

    #[serde(default)]
    pub pre_delay: Option<DelaySpec>,

    #[serde(default)]
    pub work_delay: Option<DelaySpec>,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    1
}

impl JobConfig {
    /// Build the runtime [`Job`] this entry describes.
    pub fn to_job(&self) -> Result<Job> {
        let body = JobBody {
            handler: self.handler.clone(),
            args: self.args.clone(),
        };
        let mut job = Job::new(self.id, body)
            .with_dependencies(self.after.iter().copied())
            .with_max_attempts(self.max_attempts);

        if let Some(delay) = self.pre_delay_duration()? {
            job = job.with_pre_delay(delay);
        }
        if let Some(delay) = self.work_delay_duration()? {
            job = job.with_work_delay(delay);
        }
        Ok(job)
    }

    pub fn pre_delay_duration(&self) -> Result<Option<Duration>> {
        resolve_delay(self.id, "pre_delay", self.pre_delay.as_ref())
    }

    pub fn work_delay_duration(&self) -> Result<Option<Duration>> {
        resolve_delay(self.id, "work_delay", self.work_delay.as_ref())
    }
}

fn resolve_delay(id: JobId, field: &str, spec: Option<&DelaySpec>) -> Result<Option<Duration>> {
    spec.map(DelaySpec::to_duration)
        .transpose()
        .map_err(|e| JobwaveError::ConfigError(format!("job {id}: invalid {field}: {e}")))
}

/// A delay written either as a number of seconds or as `"<n><unit>"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DelaySpec {
    Seconds(f64),
    Text(String),
}

impl DelaySpec {
    pub fn to_duration(&self) -> std::result::Result<Duration, String> {
        match self {
            DelaySpec::Seconds(secs) => {
                Duration::try_from_secs_f64(*secs).map_err(|e| format!("{secs}: {e}"))
            }
            DelaySpec::Text(s) => parse_duration(s),
        }
    }
}

/// Parse strings like `"500ms"`, `"5s"`, `"2m"`, `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
