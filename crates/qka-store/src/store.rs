//! SQLite-backed bar store
//!
//! One table per bar period, all with the same layout:
//! `code, time, open, high, low, close, volume, amount`, where `time` is a
//! millisecond timestamp.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Rows returned by [`Store::read_table`] when no limit is given
pub const DEFAULT_READ_LIMIT: usize = 100;

const MS_PER_DAY: i64 = 86_400_000;

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub code: String,
    /// Millisecond timestamp
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

impl Bar {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            time: row.get(1)?,
            open: row.get(2)?,
            high: row.get(3)?,
            low: row.get(4)?,
            close: row.get(5)?,
            volume: row.get(6)?,
            amount: row.get(7)?,
        })
    }
}

const COLUMNS: &str = "code, time, open, high, low, close, volume, amount";

/// Handle on the local market-data database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the database at `path`, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;PRAGMA synchronous=NORMAL;")?;
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(Self { conn })
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn table_exists(&self, table: &str) -> StoreResult<bool> {
        validate_table(table)?;
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Append bars, creating the table on first use. All rows land in one
    /// transaction.
    pub fn insert_bars(&mut self, table: &str, bars: &[Bar]) -> StoreResult<usize> {
        validate_table(table)?;
        if bars.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             code TEXT NOT NULL, time INTEGER NOT NULL, \
             open REAL NOT NULL, high REAL NOT NULL, low REAL NOT NULL, close REAL NOT NULL, \
             volume REAL NOT NULL, amount REAL NOT NULL);\
             CREATE INDEX IF NOT EXISTS idx_{table}_code_time ON {table}(code, time);"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))?;
            for bar in bars {
                stmt.execute(params![
                    bar.code, bar.time, bar.open, bar.high, bar.low, bar.close, bar.volume,
                    bar.amount
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(table, rows = bars.len(), "Inserted bars");
        Ok(bars.len())
    }

    /// First `limit` rows of a table, in storage order
    pub fn read_table(&self, table: &str, limit: usize) -> StoreResult<Vec<Bar>> {
        validate_table(table)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM {table} LIMIT ?1"))?;
        let rows = stmt.query_map(params![limit], Bar::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Bars of one code within `[start_ms, end_ms]`, oldest first.
    ///
    /// With `count > 0` only the most recent `count` bars are kept. A missing
    /// table yields no bars.
    pub fn query_bars(
        &self,
        table: &str,
        code: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        count: i64,
    ) -> StoreResult<Vec<Bar>> {
        if !self.table_exists(table)? {
            return Ok(Vec::new());
        }

        let start = start_ms.unwrap_or(i64::MIN);
        let end = end_ms.unwrap_or(i64::MAX);
        let limit = if count > 0 { count } else { -1 };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM (\
             SELECT {COLUMNS} FROM {table} WHERE code = ?1 AND time >= ?2 AND time <= ?3 \
             ORDER BY time DESC LIMIT ?4) ORDER BY time ASC"
        ))?;
        let rows = stmt.query_map(params![code, start, end, limit], Bar::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Distinct codes present in a table, sorted
    pub fn codes(&self, table: &str) -> StoreResult<Vec<String>> {
        if !self.table_exists(table)? {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT DISTINCT code FROM {table} ORDER BY code"))?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Distinct calendar days with at least one bar, ascending
    pub fn trade_dates(&self, table: &str) -> StoreResult<Vec<NaiveDate>> {
        if !self.table_exists(table)? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT time / {MS_PER_DAY} AS day FROM {table} ORDER BY day"
        ))?;
        let days = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut dates = Vec::new();
        for day in days {
            let day = day?;
            let date = DateTime::from_timestamp_millis(day * MS_PER_DAY)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| StoreError::InvalidRecord(format!("timestamp out of range: day {}", day)))?;
            dates.push(date);
        }
        Ok(dates)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
pub fn validate_table(table: &str) -> StoreResult<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bar(code: &str, time: i64, close: f64) -> Bar {
        Bar {
            code: code.to_string(),
            time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            amount: close * 100.0,
        }
    }

    #[test]
    fn table_names_validated() {
        assert!(validate_table("bars_1d").is_ok());
        assert!(validate_table("_tmp").is_ok());
        assert!(validate_table("").is_err());
        assert!(validate_table("1d").is_err());
        assert!(validate_table("bars; DROP TABLE x").is_err());
    }

    #[test]
    fn insert_creates_table_and_appends() {
        let mut store = Store::open_in_memory().unwrap();
        assert!(!store.table_exists("bars_1d").unwrap());

        store.insert_bars("bars_1d", &[bar("000001.SZ", 1, 10.0)]).unwrap();
        store.insert_bars("bars_1d", &[bar("000001.SZ", 2, 11.0)]).unwrap();

        let rows = store.read_table("bars_1d", DEFAULT_READ_LIMIT).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].close, 11.0);
    }

    #[test]
    fn query_respects_range_and_count() {
        let mut store = Store::open_in_memory().unwrap();
        let bars: Vec<_> = (1..=5).map(|t| bar("600000.SH", t, t as f64)).collect();
        store.insert_bars("bars_1d", &bars).unwrap();
        store.insert_bars("bars_1d", &[bar("000001.SZ", 3, 99.0)]).unwrap();

        let all = store.query_bars("bars_1d", "600000.SH", None, None, -1).unwrap();
        assert_eq!(all.iter().map(|b| b.time).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        let ranged = store.query_bars("bars_1d", "600000.SH", Some(2), Some(4), -1).unwrap();
        assert_eq!(ranged.iter().map(|b| b.time).collect::<Vec<_>>(), vec![2, 3, 4]);

        let last_two = store.query_bars("bars_1d", "600000.SH", None, None, 2).unwrap();
        assert_eq!(last_two.iter().map(|b| b.time).collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn missing_table_reads_as_empty() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.query_bars("bars_1m", "x", None, None, -1).unwrap().is_empty());
        assert!(store.codes("bars_1m").unwrap().is_empty());
        assert!(store.trade_dates("bars_1m").unwrap().is_empty());
    }

    #[test]
    fn codes_and_trade_dates_are_distinct() {
        let mut store = Store::open_in_memory().unwrap();
        let jan2 = 1_704_153_600_000; // 2024-01-02T00:00:00Z
        let jan3 = jan2 + MS_PER_DAY;
        store
            .insert_bars(
                "bars_1m",
                &[
                    bar("600000.SH", jan2 + 60_000, 1.0),
                    bar("000001.SZ", jan2 + 120_000, 1.0),
                    bar("000001.SZ", jan3 + 60_000, 1.0),
                ],
            )
            .unwrap();

        assert_eq!(store.codes("bars_1m").unwrap(), vec!["000001.SZ", "600000.SH"]);
        assert_eq!(
            store.trade_dates("bars_1m").unwrap(),
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ]
        );
    }
}
