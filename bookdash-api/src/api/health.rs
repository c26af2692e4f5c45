//! Root and health endpoints (no auth)

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Personal Reading Dashboard API is running" }))
}

/// GET /healthy
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "bookdash-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build unauthenticated routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthy", get(health_check))
}
