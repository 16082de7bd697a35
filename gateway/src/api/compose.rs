//! Pipeline submission route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use mlgate_common::{PipelineResult, PipelineStep};

use super::tasks::decode_image;
use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/compose", post(compose))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    /// Base64-encoded attachment fed to unchained steps.
    #[serde(default)]
    pub image: Option<String>,
    pub pipeline: Vec<PipelineStep>,
}

/// POST /compose - execute an ordered chain of tasks.
async fn compose(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<PipelineResult>> {
    let attachment = request
        .image
        .as_deref()
        .map(decode_image)
        .transpose()?;

    Ok(Json(
        state.composer.compose(attachment, &request.pipeline).await?,
    ))
}
