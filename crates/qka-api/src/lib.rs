//! qka-api - HTTP dispatcher for the qka gateway
//!
//! Serves a [`RoutingTable`](qka_core::RoutingTable) over HTTP. Every
//! operation is reachable as `POST /api/{operation}` with a JSON object body
//! and answers with the uniform success/failure envelope.
//!
//! # Usage
//!
//! ```ignore
//! use qka_api::{create_router, AppState};
//! use qka_core::{credential_from_config, FunctionRegistry};
//!
//! let registry = FunctionRegistry::new();
//! let state = AppState::from_registry(registry, credential_from_config(None)?)?;
//! let router = create_router(state);
//! ```
//!
//! # Concurrency
//!
//! The routing table is immutable and shared without locks. Independent
//! operations run fully in parallel. Operations registered as `serialized`
//! are invoked one at a time, because their collaborator is not reentrant.
//! Nothing is cached between calls, and a client disconnecting does not cancel
//! an invocation that has already started.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, GatewayOptions};

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api", get(handlers::operations::list_operations))
        .route("/api/{operation}", post(handlers::dispatch::invoke_operation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_credential,
        ));

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        .merge(api)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
