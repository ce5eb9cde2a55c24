//! Operation listing handler

use axum::extract::State;
use axum::Json;
use qka_core::{Envelope, OperationList};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api
/// List every registered operation with its parameter schema
pub async fn list_operations(State(state): State<AppState>) -> Result<Json<Envelope>, ApiError> {
    let list = OperationList {
        items: state.routes().descriptors().into_iter().cloned().collect(),
    };
    let data = serde_json::to_value(list).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(Envelope::ok(data)))
}
