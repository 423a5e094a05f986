// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{JobwaveError, Result};
use crate::exec::HandlerRegistry;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::JobwaveError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.job))
    }
}

/// Semantic checks on a freshly parsed config.
///
/// Cyclic graphs are deliberately not rejected; they stall at run time.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_scheduler_section(cfg)?;
    validate_job_ids(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_delays(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobwaveError::ConfigError(
            "config must contain at least one [[job]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.capacity == 0 {
        return Err(JobwaveError::ConfigError(
            "[scheduler].capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.job.len() > cfg.scheduler.capacity {
        return Err(JobwaveError::ConfigError(format!(
            "{} jobs declared but [scheduler].capacity is {}",
            cfg.job.len(),
            cfg.scheduler.capacity
        )));
    }

    Ok(())
}

fn validate_job_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for job in &cfg.job {
        if !seen.insert(job.id) {
            return Err(JobwaveError::ConfigError(format!(
                "job id {} is declared more than once",
                job.id
            )));
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let ids: HashSet<_> = cfg.job.iter().map(|job| job.id).collect();

    for job in &cfg.job {
        for dep in &job.after {
            if *dep == job.id {
                return Err(JobwaveError::ConfigError(format!(
                    "job {} cannot depend on itself in `after`",
                    job.id
                )));
            }
            if !ids.contains(dep) {
                return Err(JobwaveError::ConfigError(format!(
                    "job {} has unknown dependency {} in `after`",
                    job.id, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_delays(cfg: &RawConfigFile) -> Result<()> {
    for job in &cfg.job {
        job.pre_delay_duration()?;
        job.work_delay_duration()?;
    }
    Ok(())
}

/// Check that every job names a handler present in `registry`.
pub fn validate_handlers(cfg: &ConfigFile, registry: &HandlerRegistry) -> Result<()> {
    for job in cfg.jobs() {
        if !registry.contains(&job.handler) {
            let mut known: Vec<_> = registry.names().collect();
            known.sort_unstable();
            return Err(JobwaveError::ConfigError(format!(
                "job {} uses unknown handler '{}' (known: {})",
                job.id,
                job.handler,
                known.join(", ")
            )));
        }
    }
    Ok(())
}
