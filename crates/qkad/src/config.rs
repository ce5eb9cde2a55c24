//! Daemon configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! # token = "explicit-secret"   # omit to derive from the machine id
//! strict_params = false
//!
//! [store]
//! path = "data/qka.db"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Explicit shared secret; absent or empty means machine derivation
    pub token: Option<String>,
    /// Reject request keys that match no declared parameter
    pub strict_params: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            token: None,
            strict_params: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/qka.db"),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
    pub store: Option<PathBuf>,
    pub strict_params: bool,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if overrides.token.is_some() {
            self.server.token = overrides.token;
        }
        if let Some(path) = overrides.store {
            self.store.path = path;
        }
        self.server.strict_params |= overrides.strict_params;
        self
    }
}
