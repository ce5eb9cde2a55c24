//! qkad - qka Gateway Daemon
//!
//! Exposes the market-data operations as `POST /api/{operation}` endpoints,
//! guarded by a shared token.
//!
//! Usage:
//!   qkad [OPTIONS] [config.toml]
//!
//! Without an explicit token the daemon derives one from the machine id, so
//! restarts on the same host keep the same token. The token is printed at
//! startup for clients to use.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use qka_api::{create_router, AppState, GatewayOptions};
use qka_core::{credential_from_config, FunctionRegistry, UnknownParams};
use qka_data::{register_operations, StoreSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DaemonConfig, Overrides};

#[derive(Parser)]
#[command(name = "qkad")]
#[command(version, about = "qka gateway daemon")]
struct Args {
    /// Config file (TOML)
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "QKA_HOST")]
    host: Option<String>,

    /// Bind port
    #[arg(short, long, env = "QKA_PORT")]
    port: Option<u16>,

    /// Shared secret; derived from the machine id when omitted
    #[arg(long, env = "QKA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// SQLite store to serve bars from
    #[arg(long, env = "QKA_STORE")]
    store: Option<PathBuf>,

    /// Reject request parameters the operation does not declare
    #[arg(long)]
    strict_params: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qkad=info,qka_api=info,qka_data=info,qka_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            DaemonConfig::load(path)?
        }
        None => DaemonConfig::default(),
    }
    .apply(Overrides {
        host: args.host,
        port: args.port,
        token: args.token,
        store: args.store,
        strict_params: args.strict_params,
    });

    tracing::info!("Starting qkad (qka Gateway Daemon)");

    let credential = credential_from_config(config.server.token.clone())
        .context("Failed to set up the access token")?;
    tracing::info!(strategy = credential.strategy(), "Credential ready");
    println!("\nAuthorization token: {}\n", credential.current_token().as_str());

    let source = StoreSource::open(&config.store.path)
        .with_context(|| format!("Failed to open store: {}", config.store.path.display()))?;
    tracing::info!(path = %config.store.path.display(), "Store opened");

    let mut registry = FunctionRegistry::new();
    register_operations(&mut registry, Arc::new(source));
    tracing::info!(operations = registry.len(), "Operations registered");

    let options = GatewayOptions {
        unknown_params: if config.server.strict_params {
            UnknownParams::Reject
        } else {
            UnknownParams::Ignore
        },
    };
    let state = AppState::from_registry(registry, credential)?.with_options(options);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
