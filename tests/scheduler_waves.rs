// tests/scheduler_waves.rs

mod common;
use crate::common::{body, init_tracing, with_timeout, CallLog, ScriptedHandler};

use std::error::Error;
use std::sync::atomic::Ordering;

use tokio::time::{Duration, Instant};

use jobwave::dag::Scheduler;
use jobwave::errors::JobwaveError;
use jobwave::exec::{HandlerFuture, HandlerRegistry, JobHandler};
use jobwave::job::{Job, JobArgs, JobBody, JobEvent};
use jobwave::types::JobStatus;

type TestResult = Result<(), Box<dyn Error>>;

/// Registry where every label is a handler that records itself and succeeds.
fn recording_registry(labels: &[&str], log: &CallLog) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for label in labels {
        registry.register(*label, ScriptedHandler::succeeding(label, log));
    }
    registry
}

/// A -> B -> C
fn chain(capacity: usize, log: &CallLog) -> Result<Scheduler, JobwaveError> {
    let mut scheduler = Scheduler::with_registry(capacity, recording_registry(&["a", "b", "c"], log));
    scheduler.add_job(Job::new(1, body("a")))?;
    scheduler.add_job(Job::new(2, body("b")).after(1))?;
    scheduler.add_job(Job::new(3, body("c")).after(2))?;
    Ok(scheduler)
}

#[tokio::test]
async fn chain_runs_one_job_per_wave_in_dependency_order() -> TestResult {
    with_timeout(async {
        init_tracing();
        let log = CallLog::new();
        let mut scheduler = chain(2, &log)?;

        assert_eq!(scheduler.ready_jobs(), vec![1]);

        let report = scheduler.run_all().await;

        assert_eq!(report.wave_ids(), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(log.entries(), vec!["a", "b", "c"]);
        assert_eq!(report.completed, vec![1, 2, 3]);
        assert!(report.all_completed());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn independent_jobs_are_batched_by_capacity() -> TestResult {
    with_timeout(async {
        init_tracing();
        let log = CallLog::new();
        let mut scheduler =
            Scheduler::with_registry(2, recording_registry(&["x", "y", "z"], &log));
        scheduler.add_job(Job::new(1, body("x")))?;
        scheduler.add_job(Job::new(2, body("y")))?;

        // Capacity also bounds how many jobs are accepted.
        let err = scheduler.add_job(Job::new(3, body("z"))).unwrap_err();
        assert!(matches!(err, JobwaveError::CapacityExceeded { capacity: 2 }));

        let mut scheduler =
            Scheduler::with_registry(3, recording_registry(&["x", "y", "z"], &log));
        scheduler.add_job(Job::new(1, body("x")))?;
        scheduler.add_job(Job::new(2, body("y")))?;
        scheduler.add_job(Job::new(3, body("z")))?;

        let report = scheduler.run_all().await;
        assert_eq!(report.wave_ids(), vec![vec![1, 2, 3]]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn add_job_beyond_capacity_leaves_jobs_untouched() -> TestResult {
    let mut scheduler = Scheduler::new(2);
    scheduler.add_job(Job::placeholder(1))?;
    scheduler.add_job(Job::placeholder(2))?;

    let err = scheduler.add_job(Job::placeholder(3)).unwrap_err();

    assert!(matches!(err, JobwaveError::CapacityExceeded { capacity: 2 }));
    let ids: Vec<_> = scheduler.jobs().iter().map(Job::id).collect();
    assert_eq!(ids, vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn duplicate_job_ids_are_rejected() -> TestResult {
    let mut scheduler = Scheduler::new(5);
    scheduler.add_job(Job::placeholder(1))?;

    let err = scheduler.add_job(Job::placeholder(1)).unwrap_err();

    assert!(matches!(err, JobwaveError::DuplicateJob(1)));
    assert_eq!(scheduler.jobs().len(), 1);
    Ok(())
}

#[tokio::test]
async fn dependents_become_ready_the_wave_after_their_last_dependency() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler =
            Scheduler::with_registry(4, recording_registry(&["a", "b", "c", "d"], &log));
        // Diamond: 1 -> {2, 3} -> 4
        scheduler.add_job(Job::new(1, body("a")))?;
        scheduler.add_job(Job::new(2, body("b")).after(1))?;
        scheduler.add_job(Job::new(3, body("c")).after(1))?;
        scheduler.add_job(Job::new(4, body("d")).after(2).after(3))?;

        let job4 = scheduler.job(4).unwrap().clone();
        assert!(!scheduler.can_start(&job4));

        let report = scheduler.run_all().await;

        assert_eq!(report.wave_ids(), vec![vec![1], vec![2, 3], vec![4]]);
        assert_eq!(report.wave_of(4), Some(3));
        assert_eq!(log.entries().last().map(String::as_str), Some("d"));

        // Finished jobs are never startable again.
        let job1 = scheduler.job(1).unwrap().clone();
        assert!(!scheduler.can_start(&job1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn failed_job_is_terminal_and_blocks_its_dependents() -> TestResult {
    with_timeout(async {
        init_tracing();
        let log = CallLog::new();
        let broken = ScriptedHandler::always_failing("broken", &log);
        let calls = broken.calls();
        let mut registry = recording_registry(&["after", "other"], &log);
        registry.register("broken", broken);

        let mut scheduler = Scheduler::with_registry(3, registry);
        scheduler.add_job(Job::new(1, body("broken")).with_max_attempts(2))?;
        scheduler.add_job(Job::new(2, body("after")).after(1))?;
        scheduler.add_job(Job::new(3, body("other")))?;

        let report = scheduler.run_all().await;

        assert_eq!(report.wave_ids(), vec![vec![1, 3]]);
        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.completed, vec![3]);
        assert_eq!(report.stalled, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.job(2).unwrap().status(), JobStatus::Waiting);
        assert_eq!(log.count("after"), 0);

        // A second run finds nothing to do: failed jobs are not retried.
        let again = scheduler.run_all().await;
        assert!(again.waves.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unsatisfiable_and_cyclic_dependencies_stall_silently() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler = Scheduler::with_registry(4, recording_registry(&["x"], &log));
        scheduler.add_job(Job::new(1, body("x")).after(99))?;
        scheduler.add_job(Job::new(2, body("x")).after(3))?;
        scheduler.add_job(Job::new(3, body("x")).after(2))?;

        let report = scheduler.run_all().await;

        assert!(report.waves.is_empty());
        assert_eq!(report.stalled, vec![1, 2, 3]);
        assert!(log.entries().is_empty());
        for job in scheduler.jobs() {
            assert_eq!(job.status(), JobStatus::Waiting);
        }
        Ok(())
    })
    .await
}

#[tokio::test(start_paused = true)]
async fn jobs_within_a_wave_run_concurrently() -> TestResult {
    let log = CallLog::new();
    let mut scheduler = Scheduler::with_registry(3, recording_registry(&["x"], &log));
    for id in 1..=3 {
        scheduler.add_job(Job::new(id, body("x")).with_work_delay(Duration::from_secs(1)))?;
    }
    let start = Instant::now();
    let report = scheduler.run_all().await;
    let elapsed = start.elapsed();

    assert_eq!(report.wave_ids(), vec![vec![1, 2, 3]]);
    assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1100), "elapsed {elapsed:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn waves_are_separated_by_a_barrier() -> TestResult {
    let log = CallLog::new();
    let mut scheduler = Scheduler::with_registry(2, recording_registry(&["slow", "fast"], &log));
    scheduler.add_job(Job::new(1, body("slow")).with_work_delay(Duration::from_secs(3)))?;
    scheduler.add_job(Job::new(2, body("fast")).with_work_delay(Duration::from_secs(1)))?;

    let start = Instant::now();
    let report = scheduler.run_all().await;

    assert_eq!(report.wave_ids(), vec![vec![1, 2]]);
    // The wave lasts as long as its slowest job.
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(log.entries(), vec!["fast", "slow"]);
    Ok(())
}

#[tokio::test]
async fn job_without_body_fails_and_its_dependents_stall() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler = Scheduler::with_registry(2, recording_registry(&["x"], &log));
        scheduler.add_job(Job::placeholder(1).with_max_attempts(3))?;
        scheduler.add_job(Job::new(2, body("x")).after(1))?;

        let report = scheduler.run_all().await;

        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.stalled, vec![2]);
        let job = scheduler.job(1).unwrap();
        assert_eq!(job.attempts_used(), 0);
        assert!(job.last_error().unwrap().contains("no body"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn attached_body_makes_placeholder_runnable() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler = Scheduler::with_registry(2, recording_registry(&["x"], &log));
        scheduler.add_job(Job::placeholder(1))?;

        scheduler.attach_body(1, JobBody::new("x"))?;
        assert!(matches!(
            scheduler.attach_body(42, JobBody::new("x")),
            Err(JobwaveError::JobNotFound(42))
        ));

        let report = scheduler.run_all().await;
        assert_eq!(report.completed, vec![1]);
        assert_eq!(log.count("x"), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn handlers_registered_after_construction_are_used() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler = Scheduler::new(1);
        scheduler.add_job(Job::new(1, body("late")))?;
        scheduler
            .registry_mut()
            .register("late", ScriptedHandler::succeeding("late", &log));

        let report = scheduler.run_all().await;
        assert_eq!(report.completed, vec![1]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn subscribers_see_waves_and_job_transitions() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut scheduler = chain(2, &log)?;
        let mut rx = scheduler.subscribe();

        scheduler.run_all().await;
        drop(scheduler);

        let mut waves = Vec::new();
        let mut finished = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                JobEvent::WaveDispatched { wave, jobs } => waves.push((wave, jobs)),
                JobEvent::Finished { id, status, .. } => finished.push((id, status)),
                _ => {}
            }
        }

        assert_eq!(waves, vec![(1, vec![1]), (2, vec![2]), (3, vec![3])]);
        assert_eq!(
            finished,
            vec![
                (1, JobStatus::Completed),
                (2, JobStatus::Completed),
                (3, JobStatus::Completed)
            ]
        );
        Ok(())
    })
    .await
}

struct PanickingHandler;

impl JobHandler for PanickingHandler {
    fn call<'a>(&'a self, _args: &'a JobArgs) -> HandlerFuture<'a> {
        Box::pin(async {
            if std::hint::black_box(true) {
                panic!("handler exploded");
            }
            Ok(())
        })
    }
}

#[tokio::test]
async fn panicking_handler_fails_only_its_own_job() -> TestResult {
    with_timeout(async {
        let log = CallLog::new();
        let mut registry = recording_registry(&["x"], &log);
        registry.register("panics", PanickingHandler);

        let mut scheduler = Scheduler::with_registry(2, registry);
        scheduler.add_job(Job::new(1, body("panics")))?;
        scheduler.add_job(Job::new(2, body("x")))?;

        let report = scheduler.run_all().await;

        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.completed, vec![2]);
        let job = scheduler.job(1).unwrap();
        assert_eq!(job.attempts_used(), 1);
        assert!(job.last_error().unwrap().contains("handler exploded"));

        // The spent attempt survives a save/load cycle, so it is not retried.
        let mut resumed = Scheduler::new(2);
        resumed.restore(scheduler.snapshot())?;
        assert_eq!(resumed.job(1).unwrap().status(), JobStatus::Failed);
        assert!(resumed.ready_jobs().is_empty());
        Ok(())
    })
    .await
}
