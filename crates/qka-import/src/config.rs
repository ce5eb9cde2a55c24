//! Importer configuration
//!
//! ```toml
//! [source]
//! path = "/data/csv/1min"
//!
//! [target]
//! path = "data/qka.db"
//! table = "bars_1m"
//! chunk_size = 50000
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qka_store::DEFAULT_CHUNK_SIZE;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory scanned recursively for `.csv` files
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub path: PathBuf,
    pub table: String,
    /// Rows per insert transaction
    pub chunk_size: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/qka.db"),
            table: "bars_1m".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// The source directory, which must be set by file or flag
    pub fn source_dir(&self) -> Result<&Path> {
        self.source
            .path
            .as_deref()
            .context("No source directory; set [source] path or pass --source")
    }
}
