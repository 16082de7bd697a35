//! Configuration for the gateway.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the gateway.
///
/// The helper endpoint is read once at startup and handed to the router at
/// construction; it is never mutated at runtime, so routing decisions stay
/// deterministic per process.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    /// Capability-advertising helper node to delegate eligible tasks to.
    #[serde(default)]
    pub helper: Option<HelperConfig>,
    /// Upstream runtime used for local execution when no worker is configured.
    #[serde(default)]
    pub upstream: Option<UpstreamConfig>,
    /// Local worker process settings.
    #[serde(default)]
    pub worker: Option<WorkerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Delegation target configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HelperConfig {
    /// Base URL of the helper node, e.g. "http://gpu-box:4080".
    pub base_url: String,
    /// Bound on the capability query. Kept short: a hung probe must not
    /// stall the routing decision.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Bound on the delegated execution itself.
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,
}

/// Upstream runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream runtime, e.g. "http://runtime:8000".
    pub base_url: String,
    #[serde(default = "default_forward_timeout")]
    pub timeout_secs: u64,
}

/// Worker subprocess configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Interpreter the worker scripts run under.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Directory containing one script per task kind (infer.py, train.py).
    pub script_dir: String,
    /// Model directory handed to every worker invocation.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// Log raw worker progress events at info instead of debug.
    #[serde(default)]
    pub log_output: bool,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4080
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_forward_timeout() -> u64 {
    120
}
fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_model_dir() -> String {
    "models/current".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (MLGATE__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("MLGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
