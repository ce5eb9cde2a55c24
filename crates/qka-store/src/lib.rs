//! qka-store - local market-data store
//!
//! A SQLite database of OHLCV bars, one table per period, plus the importer
//! that loads vendor CSV exports into it.

pub mod error;
pub mod import;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use import::{
    clean_record, csv_files, import_csv_file, normalize_code, parse_timestamp_ms, RawRecord,
    DEFAULT_CHUNK_SIZE,
};
pub use store::{validate_table, Bar, Store, DEFAULT_READ_LIMIT};
