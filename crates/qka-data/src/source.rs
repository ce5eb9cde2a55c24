//! Market-data sources
//!
//! [`MarketDataSource`] is the seam between the gateway operations and
//! whatever actually holds quotes. [`StoreSource`] answers from the local
//! SQLite mirror that `qka-import` fills.

use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use qka_store::{Bar, Store};

use crate::error::{DataError, DataResult};
use crate::symbols::Exchange;

/// Sector names understood by [`StoreSource`]
pub const SECTOR_ALL_A: &str = "沪深A股";
pub const SECTOR_SH_A: &str = "上证A股";
pub const SECTOR_SZ_A: &str = "深证A股";
pub const SECTOR_BJ_A: &str = "京市A股";

/// Blocking access to quotes, calendars and sector membership.
///
/// Implementations need not be reentrant; operations backed by a source are
/// registered as serialized.
pub trait MarketDataSource: Send + Sync {
    /// Suffixed codes belonging to a named sector
    fn sector_stocks(&self, sector: &str) -> DataResult<Vec<String>>;

    /// Every known trading day, ascending
    fn trade_dates(&self) -> DataResult<Vec<NaiveDate>>;

    /// Make history for one code available locally
    fn download_history(
        &self,
        code: &str,
        period: &str,
        start_time: &str,
        end_time: &str,
    ) -> DataResult<()>;

    /// Bars of one code, oldest first; `count > 0` keeps only the latest bars
    fn market_data(
        &self,
        code: &str,
        period: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        count: i64,
    ) -> DataResult<Vec<Bar>>;
}

/// Table holding bars of a period
pub fn bars_table(period: &str) -> String {
    format!("bars_{}", period)
}

/// Source backed by the local store
pub struct StoreSource {
    store: Mutex<Store>,
    /// Periods scanned for codes and trading days
    periods: Vec<String>,
}

impl StoreSource {
    pub fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
            periods: vec!["1d".to_string(), "1m".to_string()],
        }
    }

    pub fn open(path: impl AsRef<Path>) -> DataResult<Self> {
        Ok(Self::new(Store::open(path)?))
    }

    fn with_store<T>(&self, f: impl FnOnce(&Store) -> DataResult<T>) -> DataResult<T> {
        let store = self
            .store
            .lock()
            .map_err(|_| DataError::Source("store lock poisoned".to_string()))?;
        f(&store)
    }

    fn all_codes(&self) -> DataResult<Vec<String>> {
        self.with_store(|store| {
            let mut codes = Vec::new();
            for period in &self.periods {
                codes.extend(store.codes(&bars_table(period))?);
            }
            codes.sort();
            codes.dedup();
            Ok(codes)
        })
    }
}

impl MarketDataSource for StoreSource {
    fn sector_stocks(&self, sector: &str) -> DataResult<Vec<String>> {
        let wanted: &[Exchange] = match sector {
            SECTOR_ALL_A => &[Exchange::Shanghai, Exchange::Shenzhen],
            SECTOR_SH_A => &[Exchange::Shanghai],
            SECTOR_SZ_A => &[Exchange::Shenzhen],
            SECTOR_BJ_A => &[Exchange::Beijing],
            other => return Err(DataError::UnknownSector(other.to_string())),
        };

        Ok(self
            .all_codes()?
            .into_iter()
            .filter(|code| Exchange::of(code).is_some_and(|e| wanted.contains(&e)))
            .collect())
    }

    fn trade_dates(&self) -> DataResult<Vec<NaiveDate>> {
        self.with_store(|store| {
            let mut dates = Vec::new();
            for period in &self.periods {
                dates.extend(store.trade_dates(&bars_table(period))?);
            }
            dates.sort();
            dates.dedup();
            Ok(dates)
        })
    }

    fn download_history(
        &self,
        code: &str,
        period: &str,
        start_time: &str,
        end_time: &str,
    ) -> DataResult<()> {
        let start = crate::calendar::range_start(start_time)?;
        let end = crate::calendar::range_end(end_time)?;
        let rows = self.market_data(code, period, start, end, -1)?.len();
        if rows == 0 {
            tracing::warn!(code, period, "No local history; run qka-import to load it");
        } else {
            tracing::debug!(code, period, rows, "History available locally");
        }
        Ok(())
    }

    fn market_data(
        &self,
        code: &str,
        period: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        count: i64,
    ) -> DataResult<Vec<Bar>> {
        self.with_store(|store| {
            Ok(store.query_bars(&bars_table(period), code, start_ms, end_ms, count)?)
        })
    }
}
