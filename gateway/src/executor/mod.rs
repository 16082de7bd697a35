//! Local execution backends.
//!
//! The delegation router falls back to exactly one of these when a task is
//! not (or cannot be) delegated: an out-of-process worker script, or a
//! proxy to an upstream runtime.

mod upstream;
mod worker;

pub use upstream::UpstreamExecutor;
pub use worker::{WorkerExecutor, WorkerRunner};

use async_trait::async_trait;
use serde_json::{Map, Value};

use mlgate_common::TaskDescriptor;

use crate::error::Result;

/// A local execution backend for tasks.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Short identifier for logs ("worker", "upstream").
    fn backend(&self) -> &'static str;

    /// Execute the task to completion and return its raw payload.
    async fn execute(&self, task: &TaskDescriptor) -> Result<Map<String, Value>>;
}
