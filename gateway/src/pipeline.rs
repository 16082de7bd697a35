//! Pipeline composer: sequences task executions, threading one step's
//! output into the next.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use mlgate_common::{PipelineResult, PipelineStep, TaskDescriptor, TaskResult};

use crate::delegate::DelegationRouter;
use crate::error::{Error, Result};

pub struct PipelineComposer {
    router: Arc<DelegationRouter>,
}

impl PipelineComposer {
    pub fn new(router: Arc<DelegationRouter>) -> Self {
        Self { router }
    }

    /// Execute `steps` strictly sequentially: step *i+1* never starts
    /// before step *i*'s terminal result is recorded.
    ///
    /// A step with `uses_output_of = j` receives the serialized payload of
    /// step *j* as its attachment instead of the original one; chaining
    /// replaces the input. Every step is routed through the delegation
    /// router, so the delegate-or-local choice applies independently per
    /// step. Any step failure aborts the rest and becomes the pipeline's
    /// error, tagged with the failing step's position.
    pub async fn compose(
        &self,
        attachment: Option<Vec<u8>>,
        steps: &[PipelineStep],
    ) -> Result<PipelineResult> {
        if steps.is_empty() {
            return Err(Error::InvalidRequest("pipeline has no steps".to_string()));
        }

        let start = Instant::now();
        let mut results: Vec<TaskResult> = Vec::with_capacity(steps.len());

        for (i, step) in steps.iter().enumerate() {
            let step_attachment = match step.uses_output_of {
                Some(j) => {
                    if j >= i {
                        return Err(Error::InvalidRequest(format!(
                            "step {} references output of step {}, which has not run yet",
                            i + 1,
                            j + 1
                        )));
                    }
                    let raw = serde_json::to_vec(&results[j].payload).map_err(|e| {
                        Error::Internal(format!("failed to serialize step output: {}", e))
                    })?;
                    Some(raw)
                }
                None => attachment.clone(),
            };

            let mut task = TaskDescriptor::new(step.kind, step.params.clone());
            if let Some(bytes) = step_attachment {
                task = task.with_attachment(bytes);
            }

            let result = self.router.route(&task).await.map_err(|e| Error::PipelineStep {
                step: i + 1,
                source: Box::new(e),
            })?;
            results.push(result);
        }

        let final_output = results
            .last()
            .map(|r| Value::Object(r.payload.clone()))
            .unwrap_or(Value::Null);

        Ok(PipelineResult {
            steps: results,
            final_output,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
