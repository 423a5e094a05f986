#![allow(dead_code)]

use jobwave::config::{ConfigFile, DelaySpec, JobConfig, RawConfigFile, SchedulerSection};
use jobwave::job::JobArgs;
use jobwave::types::JobId;
use serde_json::Value;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                scheduler: SchedulerSection::default(),
                job: Vec::new(),
            },
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.scheduler.capacity = capacity;
        self
    }

    pub fn with_state_file(mut self, path: &str) -> Self {
        self.config.scheduler.state_file = Some(path.to_string());
        self
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.job.push(job);
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(id: JobId, handler: &str) -> Self {
        Self {
            job: JobConfig {
                id,
                handler: handler.to_string(),
                args: JobArgs::new(),
                after: vec![],
                pre_delay: None,
                work_delay: None,
                max_attempts: 1,
            },
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.job.args.insert(key.to_string(), value.into());
        self
    }

    pub fn after(mut self, dep: JobId) -> Self {
        self.job.after.push(dep);
        self
    }

    pub fn pre_delay(mut self, spec: &str) -> Self {
        self.job.pre_delay = Some(DelaySpec::Text(spec.to_string()));
        self
    }

    pub fn work_delay_secs(mut self, secs: f64) -> Self {
        self.job.work_delay = Some(DelaySpec::Seconds(secs));
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.job.max_attempts = n;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
