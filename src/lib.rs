// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod state;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_state_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::config::validate_handlers;
use crate::dag::{RunReport, Scheduler};
use crate::exec::builtin::builtin_registry;

pub use crate::errors::JobwaveError;
pub use crate::job::{Job, JobBody};
pub use crate::types::{JobId, JobStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - handler registry
/// - resuming from a previous state file
/// - the wave dispatch loop
/// - saving state for the next invocation
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let registry = builtin_registry();
    validate_handlers(&cfg, &registry)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let state_path = state_path(&args, &cfg);
    let mut scheduler = Scheduler::from_config(&cfg, registry)?;

    if args.fresh {
        info!("--fresh given; ignoring any previous state");
    } else if state_path.exists() {
        let summary = scheduler.load(&state_path)?;
        info!(
            path = %state_path.display(),
            merged = ?summary.merged,
            reconstructed = ?summary.reconstructed,
            archived = ?summary.archived,
            "resuming from saved state"
        );
    } else {
        debug!(path = %state_path.display(), "no saved state; starting fresh");
    }

    let report = scheduler.run_all().await;
    print_report(&report);

    if args.no_save {
        warn!("--no-save given; run state is not persisted");
    } else {
        scheduler.save(&state_path)?;
    }

    Ok(())
}

/// CLI flag wins over `[scheduler].state_file`, which wins over the default.
fn state_path(args: &CliArgs, cfg: &ConfigFile) -> PathBuf {
    args.state
        .as_ref()
        .or(cfg.scheduler.state_file.as_ref())
        .map(PathBuf::from)
        .unwrap_or_else(default_state_path)
}

fn print_report(report: &RunReport) {
    println!("jobwave: {} wave(s)", report.waves.len());
    for wave in &report.waves {
        println!("  wave {}: {:?}", wave.index, wave.jobs);
    }
    println!("  completed: {:?}", report.completed);
    if !report.failed.is_empty() {
        println!("  failed:    {:?}", report.failed);
    }
    if !report.stalled.is_empty() {
        println!("  stalled:   {:?}", report.stalled);
    }
}

/// Simple dry-run output: print scheduler settings and every job.
fn print_dry_run(cfg: &ConfigFile) {
    println!("jobwave dry-run");
    println!("  scheduler.capacity = {}", cfg.scheduler.capacity);
    if let Some(ref state_file) = cfg.scheduler.state_file {
        println!("  scheduler.state_file = {state_file}");
    }
    println!();

    println!("jobs ({}):", cfg.jobs().len());
    for job in cfg.jobs() {
        println!("  - {}", job.id);
        println!("      handler: {}", job.handler);
        if !job.args.is_empty() {
            println!("      args: {}", serde_json::Value::Object(job.args.clone()));
        }
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
        if let Some(ref delay) = job.pre_delay {
            println!("      pre_delay: {delay:?}");
        }
        if let Some(ref delay) = job.work_delay {
            println!("      work_delay: {delay:?}");
        }
        if job.max_attempts != 1 {
            println!("      max_attempts: {}", job.max_attempts);
        }
    }

    debug!("dry-run complete (no execution)");
}
