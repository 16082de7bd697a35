//! Task descriptors and normalized execution results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Run inference against a trained model.
    Infer,
    /// Train (or fine-tune) a model on a dataset.
    Train,
}

impl TaskKind {
    /// The HTTP route this task kind maps to on helpers and upstreams.
    pub fn route(&self) -> &'static str {
        match self {
            TaskKind::Infer => "/infer",
            TaskKind::Train => "/train",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Infer => write!(f, "infer"),
            TaskKind::Train => write!(f, "train"),
        }
    }
}

/// One unit of work: a task kind, its scalar parameters and an optional
/// binary attachment (e.g. an image).
///
/// Immutable once constructed; owned by the request that created it until
/// execution completes.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub kind: TaskKind,
    /// Scalar parameters: dataset id, epochs, learningRate, bundleId, ...
    pub params: Map<String, Value>,
    /// Raw attachment bytes. Content is never inspected by the gateway.
    pub attachment: Option<Vec<u8>>,
}

impl TaskDescriptor {
    pub fn new(kind: TaskKind, params: Map<String, Value>) -> Self {
        Self {
            kind,
            params,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Vec<u8>) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Normalized result of executing one task, regardless of where it ran.
///
/// The payload is passed through verbatim from the worker / helper /
/// upstream; `delegated_to` is present only for delegated executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegated_to: Option<String>,
    pub elapsed_ms: u64,
}

impl TaskResult {
    pub fn local(payload: Map<String, Value>, elapsed_ms: u64) -> Self {
        Self {
            payload,
            delegated_to: None,
            elapsed_ms,
        }
    }

    pub fn delegated(payload: Map<String, Value>, helper_id: String, elapsed_ms: u64) -> Self {
        Self {
            payload,
            delegated_to: Some(helper_id),
            elapsed_ms,
        }
    }
}
