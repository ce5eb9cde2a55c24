//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qka_core::{Envelope, GatewayError};

/// API error type that converts to a failure envelope
#[derive(Debug)]
pub enum ApiError {
    /// 401 Unauthorized
    Unauthorized(String),
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, detail) = match self {
            ApiError::Unauthorized(msg) => ("unauthorized", msg),
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::Internal(msg) => ("internal_error", msg),
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = error_type, %detail, "API error");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = error_type, %detail, "API auth error");
        } else {
            tracing::debug!(error = error_type, %detail, "API client error");
        }

        (status, Json(Envelope::failure(detail))).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Auth(msg) => ApiError::Unauthorized(msg),
            GatewayError::NotFound(msg) => ApiError::NotFound(msg),
            GatewayError::Validation(msg) => ApiError::BadRequest(msg),
            GatewayError::Invocation(e) => ApiError::Internal(e.message().to_string()),
        }
    }
}
