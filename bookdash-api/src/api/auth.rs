//! API key authentication middleware
//!
//! Protected routes expect an `X-API-Key` header matching the configured
//! key. No configured key disables auth entirely (development mode).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Validate the X-API-Key header on protected routes
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = match &state.config.api_key {
        Some(key) => key,
        // No key configured: allow all requests
        None => return Ok(next.run(request).await),
    };

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match provided {
        None => Err(ApiError::Unauthorized(
            "Missing API key. Include 'X-API-Key' header.".to_string(),
        )),
        Some(key) if key != expected => {
            warn!("Rejected request with invalid API key");
            Err(ApiError::Unauthorized("Invalid API key.".to_string()))
        }
        Some(_) => Ok(next.run(request).await),
    }
}
