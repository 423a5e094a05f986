// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::loader::default_config_path;

/// Command-line arguments for `jobwave`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobwave",
    version,
    about = "Run a dependency-ordered job graph in bounded waves, with retries and resumable state.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job graph file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// State file to resume from and save to.
    ///
    /// Overrides `[scheduler].state_file`; defaults to `jobwave-state.json`.
    #[arg(long, value_name = "PATH")]
    pub state: Option<String>,

    /// Ignore any existing state file and start from scratch.
    #[arg(long)]
    pub fresh: bool,

    /// Do not write the state file after the run.
    #[arg(long)]
    pub no_save: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBWAVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,

    /// Parse + validate, print the job graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
