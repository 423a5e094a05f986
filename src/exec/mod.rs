// src/exec/mod.rs

//! Job body execution layer.
//!
//! - [`handler`] provides the `JobHandler` trait every job body implements.
//! - [`registry`] maps stable handler names to handlers, which is what makes
//!   persisted jobs resumable.
//! - [`builtin`] contains the stock filesystem / HTTP handlers used by the
//!   `jobwave` binary.

pub mod builtin;
pub mod handler;
pub mod registry;

use std::sync::Arc;

use crate::job::EventSink;

pub use handler::{FnHandler, HandlerFuture, JobHandler};
pub use registry::HandlerRegistry;

/// Everything a job needs from its scheduler while executing.
///
/// Cheap to clone; one copy travels with each dispatched job.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub registry: Arc<HandlerRegistry>,
    pub events: EventSink,
}

impl ExecutionContext {
    pub fn new(registry: Arc<HandlerRegistry>, events: EventSink) -> Self {
        Self { registry, events }
    }
}
