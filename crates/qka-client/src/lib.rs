//! qka Client Library
//!
//! Typed HTTP client for a qka gateway. Remote operations are called by name
//! and look like ordinary async methods.
//!
//! # Example
//!
//! ```rust,no_run
//! use qka_client::{BarsRequest, QkaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QkaClient::new("http://127.0.0.1:8000", "token-from-server-log")?;
//!
//!     let code = client.add_stock_suffix("600000").await?;
//!     let bars = client.get_daily_bars(&BarsRequest::new([code]).count(20)).await?;
//!
//!     // Any registered operation, untyped
//!     let raw = client.call("get_stock_list_in_sector", serde_json::json!({"sector_name": "沪深A股"})).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! ```rust,ignore
//! use qka_client::testing::TestServer;
//!
//! let server = TestServer::start(qka_api::create_router(state), "test-token").await?;
//! let ops = server.client.list_operations().await?;
//! ```

mod client;
mod error;
pub mod testing;
mod types;

pub use client::QkaClient;
pub use error::{QkaClientError, Result};
pub use types::*;

// Re-export core types for convenience
pub use qka_core::{OperationDescriptor, ParamSpec, ParamType};
