//! Out-of-process worker protocol.
//!
//! A worker is one subprocess per task: it receives a single JSON document
//! on stdin (closed immediately after), emits zero or more `progress` JSON
//! lines and one authoritative terminal JSON line on stdout, and exits.
//! Non-JSON stdout lines are incidental diagnostics and are dropped.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use mlgate_common::{TaskDescriptor, WorkerEvent};

use super::TaskExecutor;
use crate::config::WorkerConfig;
use crate::error::{Error, Result};

/// Spawns worker processes and drives the line-oriented stdout protocol.
pub struct WorkerRunner {
    config: WorkerConfig,
}

/// A worker's authoritative terminal outcome, separated from the event
/// stream so progress lines cannot be retained by construction.
enum Terminal {
    Ok(Map<String, Value>),
    Error(String),
}

impl WorkerRunner {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    fn script_path(&self, script_id: &str) -> PathBuf {
        PathBuf::from(&self.config.script_dir).join(format!("{}.py", script_id))
    }

    /// Run the worker bound to `script_id` with `input` on stdin.
    ///
    /// `on_progress` is invoked synchronously for each progress event, in
    /// arrival order. The last terminal event observed before process exit
    /// is authoritative; earlier terminal-looking lines are superseded.
    pub async fn run<F>(
        &self,
        script_id: &str,
        input: &Value,
        mut on_progress: F,
    ) -> Result<Map<String, Value>>
    where
        F: FnMut(&Map<String, Value>) + Send,
    {
        let script_path = self.script_path(script_id);

        let mut child = Command::new(&self.config.interpreter)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::WorkerLaunch(format!(
                    "failed to spawn '{} {}': {}",
                    self.config.interpreter,
                    script_path.display(),
                    e
                ))
            })?;

        // Write the input document and close stdin. A worker that exits
        // before reading produces a broken pipe here; the run is then
        // classified by the exit rules below.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("worker stdin not captured".to_string()))?;
        let input_bytes = serde_json::to_vec(input)
            .map_err(|e| Error::Internal(format!("failed to serialize worker input: {}", e)))?;
        if let Err(e) = stdin.write_all(&input_bytes).await {
            tracing::debug!("Worker {} did not read its input: {}", script_id, e);
        }
        drop(stdin);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("worker stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("worker stderr not captured".to_string()))?;

        // Drain stderr concurrently so the worker can't block on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut last_terminal: Option<Terminal> = None;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Worker {} stdout read error: {}", script_id, e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<WorkerEvent>(line) {
                Ok(WorkerEvent::Progress { fields }) => on_progress(&fields),
                Ok(WorkerEvent::Ok { payload }) => last_terminal = Some(Terminal::Ok(payload)),
                Ok(WorkerEvent::Error { message }) => {
                    last_terminal = Some(Terminal::Error(message))
                }
                Err(_) => {
                    // Diagnostic noise, not a protocol violation.
                    tracing::trace!("Worker {} emitted non-protocol line: {}", script_id, line);
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Internal(format!("failed to wait for worker: {}", e)))?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        match last_terminal {
            Some(Terminal::Ok(payload)) => Ok(payload),
            Some(Terminal::Error(message)) => Err(Error::WorkerFailed(message)),
            None if !status.success() => {
                let diagnostic = stderr_text.trim();
                if diagnostic.is_empty() {
                    Err(Error::WorkerFailed(format!("worker exited with {}", status)))
                } else {
                    Err(Error::WorkerFailed(diagnostic.to_string()))
                }
            }
            // A clean exit without a terminal line is a protocol violation,
            // not a silent success.
            None => Err(Error::WorkerFailed("no result produced".to_string())),
        }
    }
}

/// Local execution backend that runs one worker process per task.
pub struct WorkerExecutor {
    runner: WorkerRunner,
    model_dir: String,
    log_output: bool,
}

impl WorkerExecutor {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            model_dir: config.model_dir.clone(),
            log_output: config.log_output,
            runner: WorkerRunner::new(config),
        }
    }

    /// Build the worker's stdin document from a task descriptor.
    fn worker_input(&self, task: &TaskDescriptor) -> Value {
        let mut input = task.params.clone();
        input.insert("modelDir".to_string(), json!(self.model_dir));
        if let Some(attachment) = &task.attachment {
            input.insert("imageBase64".to_string(), json!(STANDARD.encode(attachment)));
        }
        Value::Object(input)
    }
}

#[async_trait]
impl TaskExecutor for WorkerExecutor {
    fn backend(&self) -> &'static str {
        "worker"
    }

    async fn execute(&self, task: &TaskDescriptor) -> Result<Map<String, Value>> {
        let script_id = task.kind.to_string();
        let input = self.worker_input(task);
        let log_output = self.log_output;

        self.runner
            .run(&script_id, &input, |fields| {
                if log_output {
                    tracing::info!(?fields, "Worker progress");
                } else {
                    tracing::debug!(?fields, "Worker progress");
                }
            })
            .await
    }
}
