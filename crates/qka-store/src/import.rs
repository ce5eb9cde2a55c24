//! CSV ingestion
//!
//! Converts vendor minute-bar CSV exports into store rows. Source files carry
//! Chinese column headers and exchange-prefixed codes (`sz000001`); rows are
//! normalized to the store layout before insertion.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::store::{Bar, Store};

/// Rows buffered per insert transaction
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%d%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// One CSV row as exported by the vendor
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "代码")]
    pub code: String,
    #[serde(rename = "时间")]
    pub time: String,
    #[serde(rename = "开盘价")]
    pub open: f64,
    #[serde(rename = "最高价")]
    pub high: f64,
    #[serde(rename = "最低价")]
    pub low: f64,
    #[serde(rename = "收盘价")]
    pub close: f64,
    #[serde(rename = "成交量")]
    pub volume: f64,
    #[serde(rename = "成交额")]
    pub amount: f64,
}

/// Normalize a raw row into a store bar
pub fn clean_record(raw: RawRecord) -> StoreResult<Bar> {
    Ok(Bar {
        code: normalize_code(&raw.code),
        time: parse_timestamp_ms(&raw.time)?,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volume,
        amount: raw.amount,
    })
}

/// `sz000001` becomes `000001.SZ`; codes of two characters or fewer are only
/// upper-cased.
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    if code.chars().count() <= 2 {
        return code.to_uppercase();
    }
    let split = code
        .char_indices()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    let (exchange, number) = code.split_at(split);
    format!("{}.{}", number, exchange.to_uppercase())
}

/// Millisecond timestamp of a naive date-time, read as UTC
pub fn parse_timestamp_ms(text: &str) -> StoreResult<i64> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }
    Err(StoreError::InvalidRecord(format!("unrecognized time: {:?}", text)))
}

/// Import one CSV file in chunks, returning the number of rows written.
///
/// A row that fails to parse aborts the file; chunks already committed stay.
pub fn import_csv_file(
    store: &mut Store,
    table: &str,
    path: &Path,
    chunk_size: usize,
) -> StoreResult<usize> {
    let chunk_size = chunk_size.max(1);
    let mut reader = csv::Reader::from_path(path)?;
    let mut chunk = Vec::with_capacity(chunk_size.min(DEFAULT_CHUNK_SIZE));
    let mut total = 0;

    for record in reader.deserialize::<RawRecord>() {
        chunk.push(clean_record(record?)?);
        if chunk.len() >= chunk_size {
            total += store.insert_bars(table, &chunk)?;
            chunk.clear();
        }
    }
    total += store.insert_bars(table, &chunk)?;

    tracing::debug!(path = %path.display(), rows = total, "Imported file");
    Ok(total)
}

/// Every `.csv` file under `dir`, recursively, in path order
pub fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}
