//! Service info endpoints

use axum::Json;
use serde_json::{Value, json};
use tapssh_api::RootResponse;

/// `GET /api/`
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "tapssh relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
