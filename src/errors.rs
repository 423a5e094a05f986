// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{JobId, JobStatus};

#[derive(Error, Debug)]
pub enum JobwaveError {
    #[error("scheduler is full: capacity of {capacity} jobs reached")]
    CapacityExceeded { capacity: usize },

    #[error("job {0} is already registered with this scheduler")]
    DuplicateJob(JobId),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("job {id} cannot execute while {status}")]
    InvalidState { id: JobId, status: JobStatus },

    #[error("job {0} has no body to run")]
    MissingBody(JobId),

    #[error("job {id} refers to unregistered handler '{handler}'")]
    UnknownHandler { id: JobId, handler: String },

    /// A single attempt of a job body failed. Absorbed by the job and only
    /// ever logged or recorded as the job's last error.
    #[error("job {id} failed on attempt {attempt}: {message}")]
    BodyExecution {
        id: JobId,
        attempt: u32,
        message: String,
    },

    #[error("corrupt state document: {0}")]
    CorruptState(String),

    #[error("job {job} depends on job {dependency}, which is not in the state document")]
    UnknownDependency { job: JobId, dependency: JobId },

    #[error("state file not found: {}", .0.display())]
    StateFileMissing(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobwaveError>;
