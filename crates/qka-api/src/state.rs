//! Application state for the gateway API

use std::sync::Arc;

use qka_core::{
    Credential, CredentialProvider, FunctionRegistry, RegistryError, RoutingTable, UnknownParams,
};

/// Dispatch behavior knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayOptions {
    /// What to do with supplied keys that match no declared parameter
    pub unknown_params: UnknownParams,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Operation name -> descriptor + bound handler, built once at startup
    routes: Arc<RoutingTable>,
    /// Shared secret every request is checked against
    credential: Arc<dyn CredentialProvider>,
    options: GatewayOptions,
}

impl AppState {
    /// Create a new AppState from an already built routing table
    pub fn new(routes: RoutingTable, credential: Arc<dyn CredentialProvider>) -> Self {
        Self {
            routes: Arc::new(routes),
            credential,
            options: GatewayOptions::default(),
        }
    }

    /// Build the routing table from a registry and create the state
    pub fn from_registry(
        registry: FunctionRegistry,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self, RegistryError> {
        Ok(Self::new(registry.into_routing_table()?, credential))
    }

    pub fn with_options(mut self, options: GatewayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn credential(&self) -> &Credential {
        self.credential.current_token()
    }

    pub fn options(&self) -> GatewayOptions {
        self.options
    }
}
