//! Single-task submission routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use mlgate_common::{TaskDescriptor, TaskKind, TaskResult};

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/infer", post(infer))
        .route("/train", post(train))
}

/// POST /infer - route one inference task.
async fn infer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<TaskResult>> {
    let task = task_from_body(TaskKind::Infer, body)?;
    Ok(Json(state.router.route(&task).await?))
}

/// POST /train - route one training task.
async fn train(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<TaskResult>> {
    let task = task_from_body(TaskKind::Train, body)?;
    Ok(Json(state.router.route(&task).await?))
}

/// Turn a request body into a task descriptor: the `image` field becomes
/// the binary attachment, every other field stays a scalar parameter.
fn task_from_body(kind: TaskKind, mut body: Map<String, Value>) -> Result<TaskDescriptor> {
    let attachment = match body.remove("image") {
        Some(Value::String(encoded)) => Some(decode_image(&encoded)?),
        Some(_) => {
            return Err(Error::InvalidRequest(
                "'image' must be a base64-encoded string".to_string(),
            ))
        }
        None => None,
    };

    let mut task = TaskDescriptor::new(kind, body);
    if let Some(bytes) = attachment {
        task = task.with_attachment(bytes);
    }
    Ok(task)
}

/// Decode a base64 image, tolerating data-URI prefixes
/// ("data:image/jpeg;base64,...").
pub(crate) fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let data = match encoded.rsplit_once(',') {
        Some((_, data)) => data,
        None => encoded,
    };
    STANDARD
        .decode(data.trim())
        .map_err(|e| Error::InvalidRequest(format!("invalid base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_body_extracts_image() {
        let mut body = Map::new();
        body.insert("image".to_string(), json!(STANDARD.encode([1u8, 2, 3])));
        body.insert("bundleId".to_string(), json!("plants"));

        let task = task_from_body(TaskKind::Infer, body).unwrap();
        assert_eq!(task.attachment.as_deref(), Some([1u8, 2, 3].as_slice()));
        assert_eq!(task.params["bundleId"], "plants");
        assert!(task.params.get("image").is_none());
    }

    #[test]
    fn test_task_from_body_without_image() {
        let mut body = Map::new();
        body.insert("dataset".to_string(), json!("plants"));

        let task = task_from_body(TaskKind::Train, body).unwrap();
        assert!(task.attachment.is_none());
    }

    #[test]
    fn test_decode_image_strips_data_uri_prefix() {
        let encoded = format!("data:image/jpeg;base64,{}", STANDARD.encode([7u8, 8]));
        assert_eq!(decode_image(&encoded).unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image("!!! not base64 !!!").is_err());
    }

    #[test]
    fn test_non_string_image_is_rejected() {
        let mut body = Map::new();
        body.insert("image".to_string(), json!(42));
        assert!(task_from_body(TaskKind::Infer, body).is_err());
    }
}
