//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors that can reach a task's caller.
///
/// Delegation failures (unreachable helper, ineligible capability document,
/// failed forward) are deliberately absent: those are internal routing
/// decisions that downgrade to local execution and are only logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Worker launch failed: {0}")]
    WorkerLaunch(String),

    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Pipeline step {step} failed: {source}")]
    PipelineStep {
        /// 1-based position of the failing step.
        step: usize,
        source: Box<Error>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::WorkerLaunch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::WorkerFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::PipelineStep { source, .. } => source.status_code(),
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::WorkerLaunch(_) => "worker_launch_failed",
            Error::WorkerFailed(_) => "worker_failed",
            Error::Upstream(_) => "upstream_error",
            Error::PipelineStep { .. } => "pipeline_step_failed",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string()
            }
        }));

        (self.status_code(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
