//! Configuration file handling for qka-cli
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8000"
//! token = "token printed by qkad"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Gateway base URL
    pub base_url: Option<String>,
    /// Shared secret
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from the default config file, if there is one
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `<config dir>/qka/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qka").join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, server: Option<&str>, token: Option<&str>) -> Result<MergedConfig> {
        let base_url = server
            .map(String::from)
            .or_else(|| self.server.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = token
            .map(String::from)
            .or_else(|| self.server.token.clone())
            .filter(|t| !t.is_empty())
            .context("No token configured; pass --token, set QKA_TOKEN, or add it to the config file")?;
        Ok(MergedConfig { base_url, token })
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub base_url: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_win_over_file() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "http://10.0.0.2:8000"
            token = "from-file"
            "#,
        )
        .unwrap();

        let merged = config.merge_with_args(None, Some("from-cli")).unwrap();
        assert_eq!(merged.base_url, "http://10.0.0.2:8000");
        assert_eq!(merged.token, "from-cli");
    }

    #[test]
    fn defaults_and_missing_token() {
        let config = Config::default();
        assert!(config.merge_with_args(None, None).is_err());

        let merged = config.merge_with_args(None, Some("t")).unwrap();
        assert_eq!(merged.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntoken = \"abc\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.token.as_deref(), Some("abc"));
        assert!(config.server.base_url.is_none());
    }
}
