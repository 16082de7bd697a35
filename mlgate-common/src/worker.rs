//! The worker stdout protocol.
//!
//! Workers emit one JSON value per line, tagged by a `status` field:
//! zero or more `progress` lines followed by exactly one authoritative
//! terminal line (`ok` or `error`). Everything else on the line stream
//! is diagnostic noise and is dropped by the reader.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One line of worker output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// Incremental, free-form status. Forwarded to the caller's progress
    /// callback but never interpreted by the gateway.
    Progress {
        #[serde(flatten)]
        fields: Map<String, Value>,
    },
    /// Successful terminal result with its payload.
    Ok {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    /// Failed terminal result.
    Error {
        #[serde(default)]
        message: String,
    },
}

impl WorkerEvent {
    /// Whether this event ends a worker invocation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress { .. })
    }
}
