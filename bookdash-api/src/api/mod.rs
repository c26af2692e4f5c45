//! HTTP API handlers for bookdash-api

pub mod auth;
pub mod books;
pub mod health;
pub mod stats;

pub use auth::require_api_key;
pub use books::{delete_book, get_book, ingest_books, list_books, sync_books, update_status};
pub use health::health_routes;
pub use stats::{get_stats, get_trends};
