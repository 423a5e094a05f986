// src/dag/scheduler.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::readiness::ReadinessView;
use crate::dag::wave::{RunReport, Wave};
use crate::errors::{JobwaveError, Result};
use crate::exec::{ExecutionContext, HandlerRegistry};
use crate::job::{EventSink, Job, JobBody, JobEvent};
use crate::state::JobRecord;
use crate::types::{JobId, JobStatus};

/// Scheduler owns every job of one run and drives them to completion.
///
/// It is responsible for:
/// - accepting jobs up to `capacity`
/// - deciding which jobs are ready (all dependencies completed)
/// - dispatching ready jobs in waves of at most `capacity`, with a barrier
///   after each wave
/// - persisting / resuming job state (see [`crate::state`])
#[derive(Debug)]
pub struct Scheduler {
    /// Maximum number of jobs accepted, and maximum wave size.
    capacity: usize,
    /// All jobs, in insertion order.
    jobs: Vec<Job>,
    /// Completed records from a loaded document that have no live job.
    archived: Vec<JobRecord>,
    registry: Arc<HandlerRegistry>,
    events: EventSink,
}

impl Scheduler {
    pub fn new(capacity: usize) -> Self {
        Self::with_registry(capacity, HandlerRegistry::new())
    }

    pub fn with_registry(capacity: usize, registry: HandlerRegistry) -> Self {
        Self {
            capacity,
            jobs: Vec::new(),
            archived: Vec::new(),
            registry: Arc::new(registry),
            events: EventSink::disabled(),
        }
    }

    /// Construct a scheduler from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile, registry: HandlerRegistry) -> Result<Self> {
        let mut scheduler = Self::with_registry(cfg.scheduler.capacity, registry);
        for job_cfg in cfg.jobs() {
            scheduler.add_job(job_cfg.to_job()?)?;
        }
        Ok(scheduler)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All jobs in insertion order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id() == id)
    }

    /// Completed records carried over from a loaded state document.
    pub fn archived(&self) -> &[JobRecord] {
        &self.archived
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Mutable access to the handler registry (e.g. to register handlers
    /// for jobs reconstructed by `load`).
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        Arc::make_mut(&mut self.registry)
    }

    /// Start receiving [`JobEvent`]s. Replaces any earlier subscription.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<JobEvent> {
        let (sink, rx) = EventSink::channel();
        self.events = sink;
        rx
    }

    /// Append a job.
    ///
    /// Fails with `CapacityExceeded` when the scheduler is full and with
    /// `DuplicateJob` when the id is taken by a live job or an archived
    /// record; `jobs` is untouched either way.
    /// Dependencies are not validated.
    pub fn add_job(&mut self, job: Job) -> Result<()> {
        if self.jobs.len() >= self.capacity {
            return Err(JobwaveError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let taken = self.jobs.iter().any(|existing| existing.id() == job.id())
            || self.archived.iter().any(|record| record.id == job.id());
        if taken {
            return Err(JobwaveError::DuplicateJob(job.id()));
        }

        debug!(job = job.id(), deps = ?job.dependencies(), "job added");
        self.jobs.push(job);
        Ok(())
    }

    /// Supply a body for a job that has none (or replace it).
    pub fn attach_body(&mut self, id: JobId, body: JobBody) -> Result<()> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.id() == id)
            .ok_or(JobwaveError::JobNotFound(id))?;
        job.set_body(body);
        Ok(())
    }

    /// Whether `job` is ready: still waiting, with every dependency completed.
    pub fn can_start(&self, job: &Job) -> bool {
        self.readiness().can_start(job)
    }

    /// Ids of all ready jobs, in insertion order.
    pub fn ready_jobs(&self) -> Vec<JobId> {
        let view = self.readiness();
        self.jobs
            .iter()
            .filter(|job| view.can_start(job))
            .map(Job::id)
            .collect()
    }

    /// Run every job that can run, wave by wave.
    ///
    /// Each wave takes the first `capacity` ready jobs, runs them
    /// concurrently and waits for all of them before rescanning. Returns once
    /// nothing is ready; jobs whose dependencies never complete are left
    /// `Waiting` and reported as stalled.
    pub async fn run_all(&mut self) -> RunReport {
        let mut report = RunReport::default();
        info!(
            capacity = self.capacity,
            jobs = self.jobs.len(),
            "scheduler: starting run"
        );

        loop {
            let ready = self.ready_indices();
            if ready.is_empty() {
                break;
            }

            let wave: Vec<usize> = ready.into_iter().take(self.capacity.max(1)).collect();
            let index = report.waves.len() + 1;
            let ids: Vec<JobId> = wave.iter().map(|&idx| self.jobs[idx].id()).collect();

            info!(wave = index, jobs = ?ids, "scheduler: dispatching wave");
            self.events.emit(JobEvent::WaveDispatched {
                wave: index,
                jobs: ids.clone(),
            });

            self.dispatch_wave(&wave).await;
            report.waves.push(Wave { index, jobs: ids });
        }

        for job in &self.jobs {
            match job.status() {
                JobStatus::Completed => report.completed.push(job.id()),
                JobStatus::Failed => report.failed.push(job.id()),
                JobStatus::Waiting | JobStatus::Running => report.stalled.push(job.id()),
            }
        }

        if !report.stalled.is_empty() {
            warn!(
                stalled = ?report.stalled,
                "scheduler: jobs left waiting; their dependencies can never complete"
            );
        }
        info!(
            waves = report.waves.len(),
            completed = report.completed.len(),
            failed = report.failed.len(),
            stalled = report.stalled.len(),
            "scheduler: run finished"
        );

        report
    }

    fn readiness(&self) -> ReadinessView<'_> {
        ReadinessView::new(&self.jobs, self.archived.iter().map(|record| record.id))
    }

    fn ready_indices(&self) -> Vec<usize> {
        let view = self.readiness();
        self.jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| view.can_start(job))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Run one wave to completion.
    ///
    /// Every job is executed on its own task from a copy; the arena entry
    /// shows `Running` until the copy is written back.
    async fn dispatch_wave(&mut self, wave: &[usize]) {
        let ctx = ExecutionContext::new(Arc::clone(&self.registry), self.events.clone());
        let mut handles = Vec::with_capacity(wave.len());

        for &idx in wave {
            let mut job = self.jobs[idx].clone();
            self.jobs[idx].mark_dispatched();
            let ctx = ctx.clone();

            let handle = tokio::spawn(async move {
                let outcome = job.execute(&ctx).await;
                (job, outcome)
            });
            handles.push((idx, handle));
        }

        // Barrier: nothing else is scheduled until the whole wave is back.
        for (idx, handle) in handles {
            match handle.await {
                Ok((job, outcome)) => {
                    if let Err(err) = outcome {
                        warn!(job = job.id(), error = %err, "job did not run");
                    }
                    self.jobs[idx] = job;
                }
                Err(join_err) => {
                    let job = &mut self.jobs[idx];
                    error!(job = job.id(), error = %join_err, "job task aborted; marking failed");
                    job.mark_aborted(format!("job task aborted: {join_err}"));
                }
            }
        }
    }

    /// Swap in state produced by a successful load.
    pub(crate) fn replace_state(
        &mut self,
        capacity: usize,
        jobs: Vec<Job>,
        archived: Vec<JobRecord>,
    ) {
        self.capacity = capacity;
        self.jobs = jobs;
        self.archived = archived;
    }
}
