use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use jobwave::exec::{HandlerFuture, JobHandler};
use jobwave::job::JobArgs;

/// Shared, ordered record of handler invocations across jobs.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: &str) {
        self.entries.lock().unwrap().push(label.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.as_str() == label)
            .count()
    }
}

/// A handler that:
/// - records every call in a [`CallLog`] under its label
/// - fails its first `fail_first` calls, then succeeds
pub struct ScriptedHandler {
    label: String,
    log: CallLog,
    fail_first: u32,
    calls: Arc<AtomicU32>,
}

impl ScriptedHandler {
    pub fn succeeding(label: &str, log: &CallLog) -> Self {
        Self::failing_first(label, 0, log)
    }

    pub fn failing_first(label: &str, fail_first: u32, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            fail_first,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn always_failing(label: &str, log: &CallLog) -> Self {
        Self::failing_first(label, u32::MAX, log)
    }

    /// Shared invocation counter; stays valid after the handler is registered.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl JobHandler for ScriptedHandler {
    fn call<'a>(&'a self, _args: &'a JobArgs) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.log.record(&self.label);
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(anyhow!("{} scripted failure on call {call}", self.label));
            }
            Ok(())
        })
    }
}
