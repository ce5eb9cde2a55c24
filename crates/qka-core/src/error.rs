//! Common error types for the gateway

use thiserror::Error;

/// Result type for dispatch stages
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that terminate a single request before a response is produced.
///
/// Each variant corresponds to one stage of the dispatch lifecycle and carries
/// the detail string that ends up in the failure envelope.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or incorrect credential
    #[error("{0}")]
    Auth(String),

    /// Unknown operation name
    #[error("{0}")]
    NotFound(String),

    /// Required parameter missing, wrong type, or unknown parameter supplied
    #[error("{0}")]
    Validation(String),

    /// The underlying collaborator failed
    #[error("{0}")]
    Invocation(#[from] InvocationError),
}

impl GatewayError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Auth(_) => 401,
            GatewayError::NotFound(_) => 404,
            GatewayError::Validation(_) => 400,
            GatewayError::Invocation(_) => 500,
        }
    }

    /// The detail text reported to the caller
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// Failure raised by an operation's collaborator.
///
/// The message is reported verbatim as the envelope detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvocationError {
    message: String,
}

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for InvocationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for InvocationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors detected while building the routing table at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Operation registered with an empty name
    #[error("operation name must not be empty")]
    EmptyOperationName,

    /// Two operations share a name
    #[error("duplicate operation: {0}")]
    DuplicateOperation(String),

    /// Parameter registered with an empty name
    #[error("operation {0}: parameter name must not be empty")]
    EmptyParameterName(String),

    /// Two parameters of one operation share a name
    #[error("operation {operation}: duplicate parameter {parameter}")]
    DuplicateParameter { operation: String, parameter: String },

    /// Default value does not match the declared type
    #[error("operation {operation}: default for {parameter} is not a valid {expected}")]
    InvalidDefault {
        operation: String,
        parameter: String,
        expected: String,
    },
}
