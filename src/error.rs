use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Wire representation of one error: stable code, human message, free-form details.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Denied { message: String, details: Value },
    Unreachable { message: String, details: Value },
    Forbidden { message: String, details: Value },
    NotFound { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn denied(message: impl Into<String>, details: Value) -> Self {
        Self::Denied {
            message: message.into(),
            details,
        }
    }
    pub fn unreachable(message: impl Into<String>, details: Value) -> Self {
        Self::Unreachable {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "invalid_input",
            AppError::Denied { .. } => "reputation_denied",
            AppError::Unreachable { .. } => "unreachable",
            AppError::Forbidden { .. } => "forbidden",
            AppError::NotFound { .. } => "not_found",
            AppError::Internal { .. } => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Denied { .. } | AppError::Unreachable { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into its wire representation.
    pub fn to_error_info(self) -> ErrorInfo {
        let code = self.code();
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::Denied { message, details }
            | AppError::Unreachable { message, details }
            | AppError::Forbidden { message, details }
            | AppError::NotFound { message, details }
            | AppError::Internal { message, details } => (message, details),
        };
        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            AppError::Validation { message, .. }
            | AppError::Denied { message, .. }
            | AppError::Unreachable { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Internal { message, .. } => message,
        };
        write!(f, "{}: {}", self.code(), message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::internal(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
    }

    AppError::internal("Database error", json!({}))
}
