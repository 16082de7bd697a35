//! mlgate gateway - routes ML tasks to helper nodes, local workers, or
//! upstream runtimes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mlgate_gateway::executor::{TaskExecutor, UpstreamExecutor, WorkerExecutor};
use mlgate_gateway::{api, logging, AppState, Config, DelegationRouter};

/// Large enough for image attachments on JSON and multipart bodies.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml exists or set MLGATE__* environment variables.",
            e
        )
    })?;

    // Pick the local execution backend: worker scripts when configured,
    // otherwise an upstream runtime.
    let local: Arc<dyn TaskExecutor> = if let Some(worker) = config.worker.clone() {
        tracing::info!(
            "Local execution backend: worker scripts in {} via {}",
            worker.script_dir,
            worker.interpreter
        );
        Arc::new(WorkerExecutor::new(worker))
    } else if let Some(ref upstream) = config.upstream {
        tracing::info!("Local execution backend: upstream runtime at {}", upstream.base_url);
        Arc::new(UpstreamExecutor::new(upstream))
    } else {
        return Err(
            "No local execution backend configured: set [worker] or [upstream] in config.toml"
                .into(),
        );
    };

    match &config.helper {
        Some(helper) => tracing::info!("Delegation helper configured: {}", helper.base_url),
        None => tracing::info!("No helper configured, all tasks execute locally"),
    }

    let router = Arc::new(DelegationRouter::new(config.helper.clone(), local));
    let state = Arc::new(AppState::new(config.clone(), router));

    // Build router
    let app = Router::new()
        .merge(api::router())
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
