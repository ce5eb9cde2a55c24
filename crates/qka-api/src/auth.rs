//! Shared-secret authentication middleware
//!
//! Validates the `X-Token` header on every `/api` request. `/health` is
//! mounted outside this layer and stays open.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use qka_core::{GatewayError, CREDENTIAL_HEADER};

use crate::error::ApiError;
use crate::state::AppState;

/// Axum middleware function that checks the credential header.
///
/// Runs before the operation is resolved, so an unknown operation with a bad
/// token is reported as unauthorized.
pub async fn require_credential(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(token) if state.credential().matches(token) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Invalid token");
            Err(GatewayError::Auth("invalid token".to_string()).into())
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Missing X-Token header");
            Err(GatewayError::Auth("missing X-Token header".to_string()).into())
        }
    }
}
