//! qka-data - A-share market-data operations
//!
//! The collaborator the gateway exposes: stock-code helpers, the trading
//! calendar, sector constituents, history download and bar queries. Quote
//! access goes through [`MarketDataSource`], so the same operations can be
//! served from the local store or from any other feed.
//!
//! ```ignore
//! use std::sync::Arc;
//! use qka_core::FunctionRegistry;
//! use qka_data::{register_operations, StoreSource};
//!
//! let mut registry = FunctionRegistry::new();
//! register_operations(&mut registry, Arc::new(StoreSource::open("data/qka.db")?));
//! ```

pub mod calendar;
pub mod error;
pub mod operations;
pub mod source;
pub mod symbols;

pub use calendar::CalendarFormat;
pub use error::{DataError, DataResult};
pub use operations::{register_operations, BAR_COLUMNS};
pub use source::{bars_table, MarketDataSource, StoreSource};
pub use symbols::{add_stock_suffix, add_stock_suffix_list, get_stock_market_type, Exchange, MarketType};
