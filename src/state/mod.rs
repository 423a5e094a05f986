// src/state/mod.rs

//! Run-state persistence.
//!
//! - [`document`] is the on-disk JSON model (`StateDocument` / `JobRecord`)
//!   plus its structural validation.
//! - [`persist`] implements `Scheduler::save` / `Scheduler::load` and the
//!   merge rules applied when a document is loaded into a scheduler that
//!   may already hold jobs.

pub mod document;
pub mod persist;

pub use document::{JobRecord, StateDocument};
pub use persist::LoadSummary;
