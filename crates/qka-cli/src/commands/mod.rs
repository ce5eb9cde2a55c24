//! Command implementations

mod bars;
mod call;
mod download;
mod operations;
mod stocks;

pub use bars::bars;
pub use call::call;
pub use download::{download, sync, DownloadArgs};
pub use operations::{health, operations};
pub use stocks::{calendar, main_board, market_type, sector, suffix};

use anyhow::{Context, Result};
use qka_client::QkaClient;

use crate::config::MergedConfig;

/// Build a client from the merged configuration
pub fn connect(config: &MergedConfig) -> Result<QkaClient> {
    QkaClient::new(&config.base_url, &config.token)
        .with_context(|| format!("Failed to create client for {}", config.base_url))
}
