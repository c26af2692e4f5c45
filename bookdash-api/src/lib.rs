//! bookdash-api library - Personal Reading Dashboard backend
//!
//! Ingests Goodreads CSV exports, enriches books via the Google Books API,
//! persists them to SQLite, and serves CRUD plus statistics endpoints.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

use config::Config;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved runtime configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// Book routes require the API key when one is configured; the root and
/// health endpoints never do.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    let protected = Router::new()
        .route("/books/ingest", post(api::ingest_books))
        .route("/books/sync", post(api::sync_books))
        .route("/books", get(api::list_books))
        .route("/books/stats", get(api::get_stats))
        .route("/books/trends", get(api::get_trends))
        .route("/books/:id", get(api::get_book).delete(api::delete_book))
        .route("/books/:id/status", patch(api::update_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_api_key,
        ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
