//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::{ssh, system, ws};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/health", get(system::health))
        .route("/api", get(system::root))
        .route("/api/", get(system::root))
        // SSH relay
        .route("/api/ssh/execute", post(ssh::execute))
        .route("/api/ssh/logs", get(ssh::logs))
        .route("/api/ws/{client_id}", get(ws::connect))
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
