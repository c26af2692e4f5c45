//! Aggregate statistics endpoints

use axum::{extract::State, Json};

use crate::db::books::{reading_stats, reading_trends, StatsReport, TrendRow};
use crate::error::ApiResult;
use crate::AppState;

/// GET /books/stats
///
/// Totals and genre breakdown over books with status `read`.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsReport>> {
    Ok(Json(reading_stats(&state.db).await?))
}

/// GET /books/trends
///
/// Pages and books finished per year/month/genre.
pub async fn get_trends(State(state): State<AppState>) -> ApiResult<Json<Vec<TrendRow>>> {
    Ok(Json(reading_trends(&state.db).await?))
}
