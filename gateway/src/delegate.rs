//! Delegation router: decides, per task, whether to forward execution to a
//! capability-advertising helper node or run it on the local backend.
//!
//! Delegation is an optimization, never a hard dependency: every probe or
//! forward failure silently downgrades to local execution. Decisions are
//! computed fresh for every task since helper availability can change
//! between calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Map, Value};

use mlgate_common::{TaskDescriptor, TaskResult};

use crate::config::HelperConfig;
use crate::error::Result;
use crate::executor::TaskExecutor;
use crate::multipart::task_body;
use crate::probe::CapabilityProbe;

pub struct DelegationRouter {
    helper: Option<HelperConfig>,
    probe: CapabilityProbe,
    forward_client: Client,
    local: Arc<dyn TaskExecutor>,
}

impl DelegationRouter {
    pub fn new(helper: Option<HelperConfig>, local: Arc<dyn TaskExecutor>) -> Self {
        let probe_timeout = helper.as_ref().map(|h| h.probe_timeout_secs).unwrap_or(5);
        let forward_timeout = helper
            .as_ref()
            .map(|h| h.forward_timeout_secs)
            .unwrap_or(120);

        Self {
            probe: CapabilityProbe::new(Duration::from_secs(probe_timeout)),
            // The forward bound is the actual work, not a capability check,
            // so it is much longer than the probe's.
            forward_client: Client::builder()
                .timeout(Duration::from_secs(forward_timeout))
                .build()
                .expect("Failed to create HTTP client"),
            helper,
            local,
        }
    }

    /// Execute one task, delegating when a configured helper advertises an
    /// available GPU and falling back to the local backend otherwise.
    pub async fn route(&self, task: &TaskDescriptor) -> Result<TaskResult> {
        let start = Instant::now();

        if let Some(helper) = &self.helper {
            match self.probe.probe(&helper.base_url).await {
                Some(doc) if doc.gpu_available() => {
                    match self.forward(&helper.base_url, task).await {
                        Ok(payload) => {
                            let helper_id = doc
                                .device
                                .id
                                .clone()
                                .unwrap_or_else(|| helper.base_url.clone());
                            tracing::info!("Delegated {} task to {}", task.kind, helper_id);
                            return Ok(TaskResult::delegated(
                                payload,
                                helper_id,
                                start.elapsed().as_millis() as u64,
                            ));
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Delegated {} task failed, falling back to local: {}",
                                task.kind,
                                e
                            );
                        }
                    }
                }
                Some(_) => {
                    tracing::debug!(
                        "Helper {} does not advertise an available GPU, executing locally",
                        helper.base_url
                    );
                }
                None => {
                    tracing::debug!("Helper {} unavailable, executing locally", helper.base_url);
                }
            }
        }

        let payload = self.local.execute(task).await?;
        tracing::debug!("Executed {} task via {} backend", task.kind, self.local.backend());
        Ok(TaskResult::local(
            payload,
            start.elapsed().as_millis() as u64,
        ))
    }

    /// Forward the task to the helper. Errors here never reach the task's
    /// caller; they only select the fallback branch.
    async fn forward(
        &self,
        base_url: &str,
        task: &TaskDescriptor,
    ) -> std::result::Result<Map<String, Value>, String> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), task.kind.route());

        let response = task_body(self.forward_client.post(&url), task)
            .send()
            .await
            .map_err(|e| format!("POST {} failed: {}", url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} returned {}: {}", url, status, body));
        }

        response
            .json::<Map<String, Value>>()
            .await
            .map_err(|e| format!("malformed helper response from {}: {}", url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockExecutor;
    use mlgate_common::TaskKind;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn helper_config(base_url: &str) -> Option<HelperConfig> {
        Some(HelperConfig {
            base_url: base_url.to_string(),
            probe_timeout_secs: 5,
            forward_timeout_secs: 5,
        })
    }

    fn infer_task() -> TaskDescriptor {
        TaskDescriptor::new(TaskKind::Infer, Map::new()).with_attachment(vec![1, 2, 3])
    }

    async fn mount_capabilities(server: &MockServer, gpu: &str, expect: u64) {
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": { "id": "gpu-box" },
                "capabilities": [{ "type": "compute", "gpu": gpu }],
            })))
            .expect(expect)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_no_helper_configured_executes_locally() {
        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(None, local.clone());

        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_helper_without_gpu_executes_locally() {
        let server = MockServer::start().await;
        mount_capabilities(&server, "busy", 1).await;
        // The forward endpoint must never be hit.
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_helper_executes_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_eligible_helper_receives_forward() {
        let server = MockServer::start().await;
        mount_capabilities(&server, "available", 1).await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "prediction": "cat" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        let result = router.route(&infer_task()).await.unwrap();

        assert_eq!(result.delegated_to.as_deref(), Some("gpu-box"));
        assert_eq!(result.payload["prediction"], "cat");
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn test_forward_failure_falls_back_to_local() {
        let server = MockServer::start().await;
        mount_capabilities(&server, "available", 1).await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(500).set_body_string("helper exploded"))
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        // The task still completes; delegation failure alone is never the
        // task's terminal error.
        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_forward_body_falls_back_to_local() {
        let server = MockServer::start().await;
        mount_capabilities(&server, "available", 1).await;
        // 2xx status but no decodable result.
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_timeout_falls_back_to_local() {
        let server = MockServer::start().await;
        mount_capabilities(&server, "available", 1).await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "prediction": "cat" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(
            Some(HelperConfig {
                base_url: server.uri(),
                probe_timeout_secs: 5,
                forward_timeout_secs: 1,
            }),
            local.clone(),
        );

        let result = router.route(&infer_task()).await.unwrap();

        assert!(result.delegated_to.is_none());
        assert_eq!(local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_decision_is_fresh_per_task() {
        let server = MockServer::start().await;
        // Two routed tasks must produce two probes, never a cached decision.
        mount_capabilities(&server, "available", 2).await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(2)
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local.clone());

        router.route(&infer_task()).await.unwrap();
        router.route(&infer_task()).await.unwrap();
    }

    #[tokio::test]
    async fn test_provenance_falls_back_to_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": {},
                "capabilities": [{ "type": "compute", "gpu": "available" }],
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let local = Arc::new(MockExecutor::new());
        let router = DelegationRouter::new(helper_config(&server.uri()), local);

        let result = router.route(&infer_task()).await.unwrap();
        assert_eq!(result.delegated_to.as_deref(), Some(server.uri().as_str()));
    }
}
