// src/exec/handler.rs

//! Pluggable job body abstraction.
//!
//! The scheduler never sees closures directly: it looks up a [`JobHandler`]
//! by name and calls it with the job's keyword arguments. Production code
//! uses the handlers in [`super::builtin`]; tests register their own.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::job::JobArgs;

/// Future returned by a handler invocation.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting a job body.
///
/// Returning `Ok(())` is success; any error fails the current attempt. The
/// return value is never inspected beyond that.
pub trait JobHandler: Send + Sync {
    fn call<'a>(&'a self, args: &'a JobArgs) -> HandlerFuture<'a>;
}

/// Adapter turning an async closure into a [`JobHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> JobHandler for FnHandler<F>
where
    F: Fn(JobArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn call<'a>(&'a self, args: &'a JobArgs) -> HandlerFuture<'a> {
        Box::pin((self.f)(args.clone()))
    }
}
