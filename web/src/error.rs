//! Error types for web handlers.
//!
//! Bridges the core's tagged errors into HTTP responses via Axum's
//! `IntoResponse`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gather_core::RegistryError;
use serde::Serialize;

/// Application error type for web handlers.
///
/// Wraps a status, a user-facing message, and a stable machine code.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }
}

/// Response body for errors, matching the `{"error": …}` shape the
/// API has always produced, plus a machine-readable code.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, message = %self.message, "request failed");
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        let (status, code) = match &err {
            RegistryError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION"),
            RegistryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            RegistryError::EventInPast => (StatusCode::FORBIDDEN, "EVENT_IN_PAST"),
            RegistryError::EventFull => (StatusCode::FORBIDDEN, "EVENT_FULL"),
            RegistryError::DuplicateRegistration => {
                (StatusCode::CONFLICT, "DUPLICATE_REGISTRATION")
            }
            RegistryError::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            RegistryError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            RegistryError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            RegistryError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        // Infrastructure detail stays in the logs, not the response.
        let message = match &err {
            RegistryError::Internal(detail) => {
                tracing::error!(%detail, "internal error reached the dispatcher");
                "Internal server error".to_owned()
            }
            RegistryError::StoreUnavailable(_) => "Service temporarily unavailable".to_owned(),
            other => other.to_string(),
        };
        Self::new(status, message, code)
    }
}
