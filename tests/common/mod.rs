#![allow(dead_code)]

pub use jobwave_test_utils::builders;
pub use jobwave_test_utils::fake_handler::{CallLog, ScriptedHandler};
pub use jobwave_test_utils::{init_tracing, with_timeout};

use jobwave::job::JobBody;

/// Body that invokes the handler registered under `name` with no arguments.
pub fn body(name: &str) -> JobBody {
    JobBody::new(name)
}
