//! Response envelope shared by server and client

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the header carrying the shared secret
pub const CREDENTIAL_HEADER: &str = "x-token";

/// Uniform wrapper around every `/api` response body.
///
/// Success: `{"success": true, "data": ...}`.
/// Failure: `{"success": false, "detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            detail: None,
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            detail: Some(detail.into()),
        }
    }

    /// Split into the success payload or the failure detail
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(self.detail.unwrap_or_default())
        }
    }
}
