//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Storage**: Tests a key lookup
/// 2. **Whitelist**: Reports snapshot size, or that the stage is disabled
/// 3. **TLD tables**: Reports table sizes, or that the stage is disabled
///
/// A disabled stage counts as healthy.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "storage": { "status": "ok" },
///     "whitelist": { "status": "ok", "message": "42 patterns" },
///     "tld_tables": { "status": "ok", "message": "2-level: 5700, 3-level: 120" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let storage_check = check_storage(&state).await;

    let whitelist_check = check_whitelist(&state);

    let tld_check = check_tld_tables(&state);

    let all_healthy = storage_check.status == "ok"
        && whitelist_check.status == "ok"
        && tld_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage: storage_check,
            whitelist: whitelist_check,
            tld_tables: tld_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks store connectivity with a key lookup.
async fn check_storage(state: &AppState) -> CheckStatus {
    match state.link_service.ping().await {
        Ok(()) => CheckStatus {
            status: "ok".to_string(),
            message: None,
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Storage error: {}", e)),
        },
    }
}

/// Reports the whitelist snapshot, if the stage is enabled.
fn check_whitelist(state: &AppState) -> CheckStatus {
    let Some(whitelist) = &state.whitelist else {
        return CheckStatus {
            status: "ok".to_string(),
            message: Some("disabled".to_string()),
        };
    };

    match whitelist.snapshot_len() {
        Some(count) => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("{} patterns", count)),
        },
        None => CheckStatus {
            status: "ok".to_string(),
            message: Some("not loaded, accepting all hosts".to_string()),
        },
    }
}

/// Reports TLD table sizes, if the blocklist stage is enabled.
fn check_tld_tables(state: &AppState) -> CheckStatus {
    let Some(tlds) = &state.tlds else {
        return CheckStatus {
            status: "ok".to_string(),
            message: Some("disabled".to_string()),
        };
    };

    let sets = tlds.sets();
    CheckStatus {
        status: "ok".to_string(),
        message: Some(format!(
            "2-level: {}, 3-level: {}",
            sets.two_level.len(),
            sets.three_level.len()
        )),
    }
}
