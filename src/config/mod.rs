// src/config/mod.rs

//! Job graph configuration for the `jobwave` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate ids, dependencies, delays and capacity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, DelaySpec, JobConfig, RawConfigFile, SchedulerSection};
pub use validate::validate_handlers;
