//! Task submission HTTP API.

pub mod compose;
pub mod health;
pub mod tasks;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tasks::router())
        .merge(compose::router())
        .route("/health", get(health::health))
}
