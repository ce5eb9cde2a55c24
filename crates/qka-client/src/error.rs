//! Error types for qka client operations

use thiserror::Error;

/// Result type alias for qka client operations
pub type Result<T> = std::result::Result<T, QkaClientError>;

/// Errors that can occur while calling a gateway
#[derive(Error, Debug)]
pub enum QkaClientError {
    /// Gateway rejected the credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Operation is not registered on the gateway
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parameters did not bind against the operation schema
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// Any other failure envelope, usually a collaborator error
    #[error("Remote error {status}: {detail}")]
    Remote { status: u16, detail: String },

    /// Request never produced a usable envelope
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Envelope payload did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("A non-empty token is required")]
    MissingToken,
}

impl QkaClientError {
    /// Build the error matching a failure envelope returned with `status`
    pub fn from_envelope(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            401 => Self::Auth(detail),
            404 => Self::NotFound(detail),
            400 => Self::Validation(detail),
            _ => Self::Remote { status, detail },
        }
    }

    /// True when the gateway answered with a failure envelope
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::NotFound(_) | Self::Validation(_) | Self::Remote { .. }
        )
    }

    /// The gateway's failure detail, if this error carries one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Auth(d) | Self::NotFound(d) | Self::Validation(d) => Some(d),
            Self::Remote { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for QkaClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
