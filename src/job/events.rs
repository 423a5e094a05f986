// src/job/events.rs

//! Monitoring side channel.
//!
//! Events never influence control flow; they exist so observers can follow a
//! run (including individual failed attempts, which are not written to the
//! job's status while it still has attempts left).

use tokio::sync::mpsc;

use crate::types::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A wave of ready jobs was dispatched.
    WaveDispatched { wave: usize, jobs: Vec<JobId> },
    /// A job moved to `Running`.
    Started { id: JobId },
    /// One attempt of a job body returned an error.
    AttemptFailed {
        id: JobId,
        attempt: u32,
        error: String,
    },
    /// A job reached its final status for this execution.
    Finished {
        id: JobId,
        status: JobStatus,
        attempts_used: u32,
    },
}

/// Optional sender for [`JobEvent`]s. A disabled sink drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<JobEvent>>,
}

impl EventSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event: JobEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is watching any more.
            let _ = tx.send(event);
        }
    }
}
