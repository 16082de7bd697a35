//! mlgate Common Types
//!
//! Shared types used by the gateway and anything that speaks its wire
//! formats: task descriptors, node capability documents, the worker
//! stdout protocol, and pipeline shapes.

pub mod capability;
pub mod pipeline;
pub mod task;
pub mod worker;

pub use capability::{CapabilityDocument, CapabilityEntry, DeviceIdentity, GPU_AVAILABLE};
pub use pipeline::{PipelineResult, PipelineStep};
pub use task::{TaskDescriptor, TaskKind, TaskResult};
pub use worker::WorkerEvent;
