//! Capability probe for candidate helper nodes.

use std::time::Duration;

use reqwest::Client;

use mlgate_common::CapabilityDocument;

/// Queries a candidate endpoint for its advertised capabilities.
///
/// Every failure mode (connection refused, non-success status, timeout,
/// malformed body) collapses to `None` so callers have exactly one
/// fallback branch. Nothing escapes this boundary as an error.
pub struct CapabilityProbe {
    http_client: Client,
}

impl CapabilityProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// GET `{base_url}/capabilities` and decode the document.
    pub async fn probe(&self, base_url: &str) -> Option<CapabilityDocument> {
        let url = format!("{}/capabilities", base_url.trim_end_matches('/'));

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Capability probe failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                "Capability probe for {} returned {}",
                url,
                response.status()
            );
            return None;
        }

        match response.json::<CapabilityDocument>().await {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::debug!("Malformed capability document from {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> CapabilityProbe {
        CapabilityProbe::new(Duration::from_millis(250))
    }

    #[tokio::test]
    async fn test_probe_returns_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": { "id": "gpu-box", "class": "workstation" },
                "capabilities": [{ "type": "compute", "gpu": "available" }],
            })))
            .mount(&server)
            .await;

        let doc = probe().probe(&server.uri()).await.unwrap();
        assert_eq!(doc.device.id.as_deref(), Some("gpu-box"));
        assert!(doc.gpu_available());
    }

    #[tokio::test]
    async fn test_probe_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(probe().probe(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(probe().probe(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "device": {} }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        assert!(probe().probe(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        // Nothing is listening on this address.
        assert!(probe().probe("http://127.0.0.1:1").await.is_none());
    }
}
