//! Upstream runtime proxy.
//!
//! Alternative local-execution path used when no worker script directory
//! is configured: tasks are POSTed to an upstream runtime with the same
//! body-shaping rules as delegated forwards.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use mlgate_common::TaskDescriptor;

use super::TaskExecutor;
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::multipart::task_body;

pub struct UpstreamExecutor {
    http_client: Client,
    base_url: String,
}

impl UpstreamExecutor {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TaskExecutor for UpstreamExecutor {
    fn backend(&self) -> &'static str {
        "upstream"
    }

    async fn execute(&self, task: &TaskDescriptor) -> Result<Map<String, Value>> {
        let url = format!("{}{}", self.base_url, task.kind.route());
        tracing::debug!("Proxying {} task to upstream: {}", task.kind, url);

        let response = task_body(self.http_client.post(&url), task)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("{}: {}", status, body)));
        }

        response
            .json::<Map<String, Value>>()
            .await
            .map_err(|e| Error::Upstream(format!("malformed upstream response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlgate_common::TaskKind;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor(base_url: &str) -> UpstreamExecutor {
        UpstreamExecutor::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_scalar_task_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/train"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "accuracy": 0.92 })),
            )
            .mount(&server)
            .await;

        let mut params = Map::new();
        params.insert("dataset".to_string(), json!("plants"));
        let task = TaskDescriptor::new(TaskKind::Train, params);

        let payload = executor(&server.uri()).execute(&task).await.unwrap();
        assert_eq!(payload["accuracy"], 0.92);
    }

    #[tokio::test]
    async fn test_attachment_task_posts_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .and(header_exists("content-type"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "prediction": "cat" })),
            )
            .mount(&server)
            .await;

        let task = TaskDescriptor::new(TaskKind::Infer, Map::new())
            .with_attachment(vec![0xff, 0xd8]);

        let payload = executor(&server.uri()).execute(&task).await.unwrap();
        assert_eq!(payload["prediction"], "cat");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/infer"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let task = TaskDescriptor::new(TaskKind::Infer, Map::new());
        let err = executor(&server.uri()).execute(&task).await.unwrap_err();
        match &err {
            Error::Upstream(msg) => assert!(msg.contains("overloaded")),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }
}
