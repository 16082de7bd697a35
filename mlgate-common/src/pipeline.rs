//! Pipeline shapes: ordered task chains where later steps may consume
//! earlier steps' outputs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::task::{TaskKind, TaskResult};

/// One step of a pipeline.
///
/// `uses_output_of` is a 0-based index into already-computed results:
/// step *i* may only reference steps *j < i*, which structurally forbids
/// forward references and cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    pub kind: TaskKind,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_output_of: Option<usize>,
}

/// Aggregate outcome of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// Per-step normalized results, in execution order.
    pub steps: Vec<TaskResult>,
    /// The last step's payload.
    pub final_output: Value,
    /// Wall-clock duration of the whole run.
    pub elapsed_ms: u64,
}
