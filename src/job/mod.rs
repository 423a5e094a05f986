// src/job/mod.rs

//! A single unit of work and its execution/retry state machine.
//!
//! - [`body`] describes *what* a job runs (a named handler + keyword args).
//! - [`events`] is the monitoring side channel jobs report to.
//!
//! A job never touches another job: dependencies are plain ids, resolved by
//! the scheduler when it checks readiness.

pub mod body;
pub mod events;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use anyhow::anyhow;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::errors::{JobwaveError, Result};
use crate::exec::ExecutionContext;
use crate::types::{JobId, JobStatus};

pub use body::{JobArgs, JobBody};
pub use events::{EventSink, JobEvent};

#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    dependencies: Vec<JobId>,
    /// Waited once per `execute`, before the first attempt.
    pre_delay: Option<Duration>,
    /// Waited before every attempt.
    work_delay: Option<Duration>,
    max_attempts: u32,
    attempts_used: u32,
    body: Option<JobBody>,
    last_error: Option<String>,
}

impl Job {
    /// A runnable job with a single attempt and no dependencies.
    pub fn new(id: JobId, body: JobBody) -> Self {
        Self {
            body: Some(body),
            ..Self::placeholder(id)
        }
    }

    /// A job with no body. It cannot run until one is attached.
    pub fn placeholder(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Waiting,
            dependencies: Vec::new(),
            pre_delay: None,
            work_delay: None,
            max_attempts: 1,
            attempts_used: 0,
            body: None,
            last_error: None,
        }
    }

    pub fn after(mut self, dependency: JobId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = JobId>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    pub fn with_pre_delay(mut self, delay: Duration) -> Self {
        self.pre_delay = Some(delay);
        self
    }

    pub fn with_work_delay(mut self, delay: Duration) -> Self {
        self.work_delay = Some(delay);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn dependencies(&self) -> &[JobId] {
        &self.dependencies
    }

    pub fn pre_delay(&self) -> Option<Duration> {
        self.pre_delay
    }

    pub fn work_delay(&self) -> Option<Duration> {
        self.work_delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn body(&self) -> Option<&JobBody> {
        self.body.as_ref()
    }

    /// Error message of the most recent failed attempt, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_body(&mut self, body: JobBody) {
        self.body = Some(body);
    }

    /// Run the job to a terminal status.
    ///
    /// Attempts `attempts_used + 1 ..= max_attempts` are tried in order until
    /// one succeeds. A panicking handler counts as a failed attempt. Attempt
    /// errors are logged, reported as
    /// [`JobEvent::AttemptFailed`] and otherwise absorbed: the returned
    /// status is the only outcome. `status` goes straight from `Running` to
    /// its final value, so observers never see a transient `Failed`.
    ///
    /// Errors:
    /// - [`JobwaveError::InvalidState`] if the job is not `Waiting`; nothing
    ///   is changed.
    /// - [`JobwaveError::MissingBody`] / [`JobwaveError::UnknownHandler`] if
    ///   there is nothing to invoke; the job is marked `Failed` without
    ///   consuming an attempt.
    pub async fn execute(&mut self, ctx: &ExecutionContext) -> Result<JobStatus> {
        if self.status != JobStatus::Waiting {
            return Err(JobwaveError::InvalidState {
                id: self.id,
                status: self.status,
            });
        }

        let Some(body) = self.body.clone() else {
            return Err(self.fail_without_attempt(ctx, JobwaveError::MissingBody(self.id)));
        };
        let Some(handler) = ctx.registry.get(&body.handler) else {
            let err = JobwaveError::UnknownHandler {
                id: self.id,
                handler: body.handler,
            };
            return Err(self.fail_without_attempt(ctx, err));
        };
        let args = body.args;

        info!(job = self.id, "job started");
        self.status = JobStatus::Running;
        ctx.events.emit(JobEvent::Started { id: self.id });

        if let Some(delay) = self.pre_delay {
            debug!(job = self.id, ?delay, "waiting before first attempt");
            tokio::time::sleep(delay).await;
        }

        if self.attempts_used >= self.max_attempts {
            warn!(
                job = self.id,
                attempts_used = self.attempts_used,
                max_attempts = self.max_attempts,
                "no attempts left to run"
            );
        }

        let mut final_status = JobStatus::Failed;

        for attempt in (self.attempts_used + 1)..=self.max_attempts {
            if let Some(delay) = self.work_delay {
                tokio::time::sleep(delay).await;
            }

            debug!(job = self.id, attempt, "invoking job body");
            let outcome = match AssertUnwindSafe(handler.call(&args)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(anyhow!("handler panicked: {}", panic_message(&*panic))),
            };
            self.attempts_used = attempt;

            match outcome {
                Ok(()) => {
                    debug!(job = self.id, attempt, "job body returned");
                    final_status = JobStatus::Completed;
                    break;
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    let failure = JobwaveError::BodyExecution {
                        id: self.id,
                        attempt,
                        message: message.clone(),
                    };
                    error!(job = self.id, attempt, error = %failure, "job attempt failed");
                    ctx.events.emit(JobEvent::AttemptFailed {
                        id: self.id,
                        attempt,
                        error: message.clone(),
                    });
                    self.last_error = Some(message);
                }
            }
        }

        self.status = final_status;
        info!(
            job = self.id,
            status = %self.status,
            attempts_used = self.attempts_used,
            "job finished"
        );
        ctx.events.emit(JobEvent::Finished {
            id: self.id,
            status: self.status,
            attempts_used: self.attempts_used,
        });

        Ok(self.status)
    }

    fn fail_without_attempt(&mut self, ctx: &ExecutionContext, err: JobwaveError) -> JobwaveError {
        error!(job = self.id, error = %err, "job cannot run; marking failed");
        self.status = JobStatus::Failed;
        self.last_error = Some(err.to_string());
        ctx.events.emit(JobEvent::Finished {
            id: self.id,
            status: self.status,
            attempts_used: self.attempts_used,
        });
        err
    }

    /// Record a failure that happened outside the job's own attempt loop,
    /// such as its task being cancelled.
    pub(crate) fn mark_aborted(&mut self, reason: String) {
        self.status = JobStatus::Failed;
        self.last_error = Some(reason);
    }

    /// Mark a job as handed to a wave. The live copy runs elsewhere.
    pub(crate) fn mark_dispatched(&mut self) {
        self.status = JobStatus::Running;
    }

    /// Overwrite persisted fields from a saved record (merge on load).
    pub(crate) fn restore_from(
        &mut self,
        status: JobStatus,
        attempts_used: u32,
        pre_delay: Option<Duration>,
        work_delay: Option<Duration>,
        dependencies: Vec<JobId>,
    ) {
        self.status = status;
        self.attempts_used = attempts_used.min(self.max_attempts);
        self.pre_delay = pre_delay;
        self.work_delay = work_delay;
        self.dependencies = dependencies;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
