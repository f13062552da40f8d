//! Handler for the bulk export endpoint.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::application::services::render_csv;
use crate::error::AppError;
use crate::state::AppState;

/// Streams every stored link as CSV.
///
/// # Endpoint
///
/// `GET /dump/{token}`
///
/// The token is generated at first startup (or set via `DUMP_KEY`) and is
/// the only access control on this endpoint.
///
/// # Response
///
/// ```text
/// token,url,created-unix-epoch-utc
/// u8ovL4,https://example.com/page,1700000000
/// ```
///
/// # Errors
///
/// Returns 403 Forbidden when the token does not match.
pub async fn dump_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if token != *state.dump_token {
        return Err(AppError::forbidden("Invalid dump token", json!({})));
    }

    let records = state.link_service.dump().await?;
    let body = render_csv(&records);

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}
