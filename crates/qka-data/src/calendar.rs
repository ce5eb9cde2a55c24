//! Trading calendar and time-bound parsing
//!
//! Times arrive as strings in the forms the vendor API accepts: `20240102`,
//! `20240102093000`, or `2024-01-02`. They are naive and read as UTC, the
//! same way imported bars are stamped.

use chrono::{DateTime, NaiveDate};
use qka_store::parse_timestamp_ms;

use crate::error::{DataError, DataResult};

const MS_PER_DAY: i64 = 86_400_000;

/// Output style of [`trade_calendar`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarFormat {
    /// `20240102`
    Number,
    /// `2024-01-02`
    Str,
}

impl CalendarFormat {
    pub fn parse(name: &str) -> DataResult<Self> {
        match name {
            "number" => Ok(CalendarFormat::Number),
            "str" => Ok(CalendarFormat::Str),
            other => Err(DataError::InvalidFormat(other.to_string())),
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            CalendarFormat::Number => "%Y%m%d",
            CalendarFormat::Str => "%Y-%m-%d",
        }
    }
}

/// Trading days in `[start, end]`, formatted
pub fn trade_calendar(
    dates: &[NaiveDate],
    start_time: &str,
    end_time: &str,
    format: CalendarFormat,
) -> DataResult<Vec<String>> {
    let start = parse_date(start_time)?;
    let end = parse_date(end_time)?;

    Ok(dates
        .iter()
        .filter(|d| **d >= start && **d <= end)
        .map(|d| d.format(format.pattern()).to_string())
        .collect())
}

pub fn parse_date(text: &str) -> DataResult<NaiveDate> {
    let ms = parse_ms(text)?;
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::InvalidTime(text.to_string()))
}

/// Lower bound in milliseconds; empty means unbounded
pub fn range_start(text: &str) -> DataResult<Option<i64>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_ms(text).map(Some)
}

/// Upper bound in milliseconds; empty means unbounded. A bare date covers
/// the whole day.
pub fn range_end(text: &str) -> DataResult<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let ms = parse_ms(text)?;
    if is_bare_date(text) {
        Ok(Some(ms + MS_PER_DAY - 1))
    } else {
        Ok(Some(ms))
    }
}

fn parse_ms(text: &str) -> DataResult<i64> {
    parse_timestamp_ms(text).map_err(|_| DataError::InvalidTime(text.trim().to_string()))
}

fn is_bare_date(text: &str) -> bool {
    let digits = text.bytes().filter(|b| b.is_ascii_digit()).count();
    digits == 8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days() -> Vec<NaiveDate> {
        [(2024, 1, 2), (2024, 1, 3), (2024, 1, 4), (2024, 1, 8)]
            .into_iter()
            .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect()
    }

    #[test]
    fn calendar_is_inclusive() {
        let out = trade_calendar(&days(), "20240103", "20240108", CalendarFormat::Number).unwrap();
        assert_eq!(out, vec!["20240103", "20240104", "20240108"]);
    }

    #[test]
    fn calendar_str_format() {
        let out = trade_calendar(&days(), "2024-01-01", "2024-01-03", CalendarFormat::Str).unwrap();
        assert_eq!(out, vec!["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(matches!(
            CalendarFormat::parse("iso"),
            Err(DataError::InvalidFormat(_))
        ));
    }

    #[test]
    fn range_bounds() {
        assert_eq!(range_start("").unwrap(), None);
        assert_eq!(range_end("  ").unwrap(), None);
        assert_eq!(range_start("20240102").unwrap(), Some(1_704_153_600_000));
        assert_eq!(range_end("20240102").unwrap(), Some(1_704_239_999_999));
        assert_eq!(range_end("20240102093100").unwrap(), Some(1_704_187_860_000));
        assert!(range_start("soon").is_err());
    }
}
