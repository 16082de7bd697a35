//! mlgate gateway.
//!
//! Accepts inference/training tasks over HTTP and decides, per task, how
//! to execute them: forward to a capability-advertising helper node, run a
//! local worker process, or proxy to an upstream runtime, and can chain
//! several such executions into a pipeline.

pub mod api;
pub mod config;
pub mod delegate;
pub mod error;
pub mod executor;
pub mod logging;
pub mod multipart;
pub mod pipeline;
pub mod probe;
pub mod state;
pub mod test_util;

pub use config::{ApiConfig, Config, HelperConfig, UpstreamConfig, WorkerConfig};
pub use delegate::DelegationRouter;
pub use error::{Error, Result};
pub use executor::{TaskExecutor, UpstreamExecutor, WorkerExecutor, WorkerRunner};
pub use multipart::MultipartBody;
pub use pipeline::PipelineComposer;
pub use probe::CapabilityProbe;
pub use state::AppState;
