//! qka-core - Core types for the qka RPC gateway
//!
//! This crate holds everything the gateway needs that is independent of the
//! HTTP transport: the operation registry and its declarative schemas, the
//! result normalizer that turns collaborator return values into JSON, and the
//! shared-secret credential provider.

pub mod credential;
pub mod error;
pub mod models;
pub mod normalize;
pub mod registry;

pub use credential::{
    credential_from_config, Credential, CredentialError, CredentialProvider, MachineCredential,
    StaticCredential,
};
pub use error::{GatewayError, GatewayResult, InvocationError, RegistryError};
pub use models::*;
pub use normalize::{normalize, MAX_DEPTH};
pub use registry::{
    operation_fn, Arguments, FunctionRegistry, Operation, OperationBuilder, Route, RoutingTable,
    UnknownParams,
};
