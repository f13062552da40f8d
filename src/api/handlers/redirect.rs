//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;

use crate::domain::entities::ShortKey;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short key to its original URL.
///
/// # Endpoint
///
/// `GET /{key}`
///
/// Responds with `302 Found` so clients keep re-resolving through the
/// service; the target URL may be remapped later.
///
/// # Errors
///
/// Returns 404 Not Found when the key is unknown or not even shaped like a
/// key.
pub async fn redirect_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let key = ShortKey::parse(&key)
        .map_err(|_| AppError::not_found("No such link", json!({ "key": key })))?;

    let record = state
        .link_service
        .resolve(&key)
        .await?
        .ok_or_else(|| AppError::not_found("No such link", json!({ "key": key.as_str() })))?;

    debug!("Redirecting {key} to {}", record.url);

    Ok((StatusCode::FOUND, [(header::LOCATION, record.url)]))
}
