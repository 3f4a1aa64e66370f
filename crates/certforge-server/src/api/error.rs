//! Mapping of domain errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use certforge_core::error::CertforgeError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by handlers and extractors. The body is always
/// `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid bearer token on a route that needs one.
    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Domain(#[from] CertforgeError),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Domain(err) => match err {
                CertforgeError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
                CertforgeError::AccountDisabled | CertforgeError::AuthorizationDenied { .. } => {
                    StatusCode::FORBIDDEN
                }
                CertforgeError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                CertforgeError::NotFound { .. } => StatusCode::NOT_FOUND,
                CertforgeError::Validation { .. } => StatusCode::BAD_REQUEST,
                CertforgeError::Database(_) | CertforgeError::Crypto(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Client-facing message. Server-side failures never expose detail.
    fn message(&self) -> String {
        match self {
            Self::Unauthenticated => "Authentication required".into(),
            Self::Domain(err) => match err {
                CertforgeError::AuthenticationFailed { .. } => {
                    "Invalid username or password".into()
                }
                CertforgeError::AccountDisabled => "Account is disabled".into(),
                CertforgeError::AuthorizationDenied { reason } => reason.clone(),
                CertforgeError::RateLimited {
                    retry_after_minutes,
                } => format!("Too many login attempts. Try again in {retry_after_minutes} minutes."),
                CertforgeError::NotFound { entity, .. } => format!("{entity} not found"),
                CertforgeError::Validation { message } => message.clone(),
                CertforgeError::Database(_) | CertforgeError::Crypto(_) => {
                    "Internal server error".into()
                }
            },
        }
    }
}

/// Malformed or incomplete request bodies are validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Domain(CertforgeError::Validation {
            message: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
