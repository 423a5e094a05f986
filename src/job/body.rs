// src/job/body.rs

//! What a job runs: the name of a registered handler plus keyword arguments.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyword arguments bound to a job body.
pub type JobArgs = serde_json::Map<String, Value>;

/// A serializable job body.
///
/// The handler itself lives in a [`crate::exec::HandlerRegistry`]; only its
/// name is stored here, which is what lets a persisted job be resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBody {
    pub handler: String,
    #[serde(default)]
    pub args: JobArgs,
}

impl JobBody {
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            args: JobArgs::new(),
        }
    }

    /// Bind a keyword argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Fetch a required string argument.
pub fn str_arg<'a>(args: &'a JobArgs, key: &str) -> Result<&'a str> {
    args.get(key)
        .ok_or_else(|| anyhow!("missing argument '{key}'"))?
        .as_str()
        .with_context(|| format!("argument '{key}' must be a string"))
}
