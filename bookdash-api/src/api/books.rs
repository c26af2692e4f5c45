//! Book CRUD and sync endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

use crate::db::books::{self, Book, BookFilter, NewBook};
use crate::error::{ApiError, ApiResult};
use crate::services::{sync_csv_to_db, GoogleBooksClient, SyncSummary};
use crate::AppState;

/// POST /books/ingest
///
/// Insert a batch of fully-formed book records.
pub async fn ingest_books(
    State(state): State<AppState>,
    Json(new_books): Json<Vec<NewBook>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    info!("Ingesting {} books via API endpoint", new_books.len());
    let count = books::insert_books(&state.db, &new_books).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Books ingested successfully", "count": count })),
    ))
}

/// Request body for POST /books/sync
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Server-side path to a Goodreads CSV export
    pub csv_path: PathBuf,
}

/// POST /books/sync
///
/// Run one full CSV reconciliation against the configured store.
pub async fn sync_books(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<SyncSummary>> {
    // Client constructed per run; no ambient global session
    let client = match &state.config.google_books_url {
        Some(url) => GoogleBooksClient::with_base_url(url),
        None => GoogleBooksClient::new(),
    };
    let summary = sync_csv_to_db(&state.db, &client, &request.csv_path).await?;
    Ok(Json(summary))
}

/// GET /books
pub async fn list_books(
    State(state): State<AppState>,
    Query(filter): Query<BookFilter>,
) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(books::list_books(&state.db, &filter).await?))
}

/// GET /books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Book>> {
    books::get_book(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no book with id {}", id)))
}

/// DELETE /books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if books::delete_book(&state.db, id).await? {
        Ok(Json(json!({ "message": "Book deleted", "id": id })))
    } else {
        Err(ApiError::NotFound(format!("no book with id {}", id)))
    }
}

/// Request body for PATCH /books/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: bookdash_common::ReadingStatus,
}

/// PATCH /books/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Value>> {
    if books::set_status(&state.db, id, update.status).await? {
        Ok(Json(json!({ "message": "Status updated", "id": id, "status": update.status })))
    } else {
        Err(ApiError::NotFound(format!("no book with id {}", id)))
    }
}
