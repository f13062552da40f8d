//! Top-level router configuration.

use crate::api::handlers::{dump_handler, health_handler, redirect_handler, shorten_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Endpoints
///
/// - `POST /api/shorten`    - Submit a URL, get its key (public)
/// - `GET  /{key}`          - Redirect to the stored URL (public)
/// - `GET  /health`         - Component health checks (public)
/// - `GET  /dump/{token}`   - CSV export, guarded by the dump token
///
/// # Middleware
///
/// - **Tracing** - Structured request/response logging
/// - **Path normalization** - Trailing slash handling
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/{key}", get(redirect_handler))
        .route("/health", get(health_handler))
        .route("/dump/{token}", get(dump_handler))
        .route("/api/shorten", post(shorten_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
