// src/dag/mod.rs

//! Dependency-aware scheduling.
//!
//! - [`scheduler`] owns the job arena and runs the wave dispatch loop.
//! - [`readiness`] decides which jobs have all dependencies completed.
//! - [`wave`] defines the per-run report types.

pub mod readiness;
pub mod scheduler;
pub mod wave;

pub use readiness::ReadinessView;
pub use scheduler::Scheduler;
pub use wave::{RunReport, Wave};
