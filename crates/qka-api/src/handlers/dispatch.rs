//! Operation dispatch handler
//!
//! Request lifecycle, terminal on the first failure:
//! authenticate (middleware) -> resolve -> bind -> invoke -> normalize -> respond.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use qka_core::{normalize, Envelope, GatewayError, InvocationError};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/{operation}
/// Invoke a registered operation with the JSON object body as parameters
#[instrument(skip_all, fields(operation = %operation))]
pub async fn invoke_operation(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope>, ApiError> {
    let route = state.routes().resolve(&operation)?;
    let supplied = parse_parameters(&body)?;
    let args = route.bind(supplied, state.options().unknown_params)?;

    let started = Instant::now();

    // Run on its own task so a panicking collaborator is contained
    let outcome = tokio::spawn(async move { route.invoke(args).await }).await;

    let returned = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Operation failed");
            return Err(GatewayError::from(err).into());
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "Operation task aborted");
            let err = InvocationError::new(format!("operation {} panicked", operation));
            return Err(GatewayError::from(err).into());
        }
    };

    let data = normalize(returned);
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Operation completed"
    );

    Ok(Json(Envelope::ok(data)))
}

/// Decode the request body into supplied parameters.
///
/// An empty body or `null` means no parameters were supplied.
fn parse_parameters(body: &[u8]) -> Result<Map<String, Value>, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::Validation(format!("invalid JSON body: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(GatewayError::Validation(
            "request body must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_no_parameters() {
        assert!(parse_parameters(b"").unwrap().is_empty());
        assert!(parse_parameters(b"  \n").unwrap().is_empty());
        assert!(parse_parameters(b"null").unwrap().is_empty());
    }

    #[test]
    fn object_body_is_parameters() {
        let map = parse_parameters(br#"{"a": 1}"#).unwrap();
        assert_eq!(map.get("a"), Some(&json!(1)));
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(matches!(
            parse_parameters(b"[1, 2]"),
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            parse_parameters(b"{not json"),
            Err(GatewayError::Validation(_))
        ));
    }
}
