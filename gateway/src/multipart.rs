//! Binary payload framer.
//!
//! Builds byte-exact multipart/form-data bodies from scalar fields plus at
//! most one binary attachment, for use against any endpoint with
//! file-upload semantics. Pure transformation: no IO, and attachment
//! content is never inspected or validated.

use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde_json::{Map, Value};
use uuid::Uuid;

use mlgate_common::TaskDescriptor;

const CRLF: &[u8] = b"\r\n";

/// Field name the attachment part is sent under.
pub const ATTACHMENT_FIELD: &str = "file";

/// A framed multipart body and its boundary token.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    /// Frame `fields` and an optional `(filename, bytes)` attachment.
    ///
    /// The boundary is derived from a random UUID nonce, so a collision
    /// with payload bytes is vanishingly unlikely.
    pub fn build(fields: &Map<String, Value>, attachment: Option<(&str, &[u8])>) -> Self {
        let boundary = format!("----mlgate{}", Uuid::new_v4().simple());
        let mut bytes = Vec::new();

        for (name, value) in fields {
            bytes.extend_from_slice(b"--");
            bytes.extend_from_slice(boundary.as_bytes());
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"", name).as_bytes(),
            );
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(scalar_text(value).as_bytes());
            bytes.extend_from_slice(CRLF);
        }

        if let Some((filename, content)) = attachment {
            bytes.extend_from_slice(b"--");
            bytes.extend_from_slice(boundary.as_bytes());
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                    ATTACHMENT_FIELD, filename
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(b"Content-Type: application/octet-stream");
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(CRLF);
            bytes.extend_from_slice(content);
            bytes.extend_from_slice(CRLF);
        }

        bytes.extend_from_slice(b"--");
        bytes.extend_from_slice(boundary.as_bytes());
        bytes.extend_from_slice(b"--");
        bytes.extend_from_slice(CRLF);

        Self { boundary, bytes }
    }

    /// The Content-Type header value matching this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Render a scalar parameter as form-field text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Attach a task's body to an outgoing request: multipart framing for tasks
/// with a binary attachment, plain JSON otherwise. Shared by delegated
/// forwards and the upstream proxy.
pub(crate) fn task_body(builder: RequestBuilder, task: &TaskDescriptor) -> RequestBuilder {
    match &task.attachment {
        Some(content) => {
            let body = MultipartBody::build(&task.params, Some(("attachment.bin", content)));
            builder
                .header(CONTENT_TYPE, body.content_type())
                .body(body.bytes)
        }
        None => builder.json(&Value::Object(task.params.clone())),
    }
}
