//! Handler for the URL submission endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL and returns its key.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// ```json
/// { "id": "u8ovL4" }
/// ```
///
/// Submitting the same URL again returns the same key.
///
/// # Errors
///
/// Returns 400 Bad Request when validation fails, when the reputation gate
/// denies the host, or when the URL does not answer a test request.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let key = state.link_service.submit(&payload.url).await?;

    Ok(Json(ShortenResponse {
        id: key.to_string(),
    }))
}
