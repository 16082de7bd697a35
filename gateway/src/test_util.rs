//! Test doubles shared by unit and integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use mlgate_common::TaskDescriptor;

use crate::error::{Error, Result};
use crate::executor::TaskExecutor;

/// A local backend that records every task it receives and answers with a
/// call-numbered payload, optionally failing on one specific call.
pub struct MockExecutor {
    calls: Mutex<Vec<TaskDescriptor>>,
    fail_on_call: Option<usize>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    /// Fail the n-th execute call (1-based) with a worker error.
    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        }
    }

    /// Tasks received so far, in order.
    pub fn calls(&self) -> Vec<TaskDescriptor> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn execute(&self, task: &TaskDescriptor) -> Result<Map<String, Value>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(task.clone());
            calls.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(Error::WorkerFailed(format!("mock failure on call {}", call)));
        }

        let mut payload = Map::new();
        payload.insert("output".to_string(), json!(format!("out-{}", call)));
        payload.insert("call".to_string(), json!(call));
        Ok(payload)
    }
}
