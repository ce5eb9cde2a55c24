//! Stock code conventions for the Shanghai, Shenzhen and Beijing exchanges

use std::fmt;

use crate::error::{DataError, DataResult};

const SZ_PREFIXES: &[&str] = &["00", "30", "15", "16", "18", "12"];
const SH_PREFIXES: &[&str] = &["60", "68", "11"];
const BJ_PREFIXES: &[&str] = &["83", "43"];

/// Listing exchange, written as the code suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl Exchange {
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Shanghai => "SH",
            Exchange::Shenzhen => "SZ",
            Exchange::Beijing => "BJ",
        }
    }

    /// Exchange of a suffixed code such as `600000.SH`
    pub fn of(code: &str) -> Option<Self> {
        match code.rsplit_once('.')?.1.to_ascii_uppercase().as_str() {
            "SH" => Some(Exchange::Shanghai),
            "SZ" => Some(Exchange::Shenzhen),
            "BJ" => Some(Exchange::Beijing),
            _ => None,
        }
    }
}

/// Board a stock trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketType {
    Main,
    ChiNext,
    Star,
    Beijing,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Main => "主板",
            MarketType::ChiNext => "创业板",
            MarketType::Star => "科创板",
            MarketType::Beijing => "北交所",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append the exchange suffix to a bare 6-digit code.
///
/// Codes that already contain a `.` are returned unchanged. Unknown prefixes
/// default to Shanghai.
pub fn add_stock_suffix(code: &str) -> DataResult<String> {
    if code.contains('.') {
        return Ok(code.to_string());
    }
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DataError::InvalidCode(code.to_string()));
    }

    let exchange = if starts_with_any(code, SZ_PREFIXES) {
        Exchange::Shenzhen
    } else if starts_with_any(code, SH_PREFIXES) {
        Exchange::Shanghai
    } else if starts_with_any(code, BJ_PREFIXES) {
        Exchange::Beijing
    } else {
        Exchange::Shanghai
    };
    Ok(format!("{}.{}", code, exchange.suffix()))
}

pub fn add_stock_suffix_list<S: AsRef<str>>(codes: &[S]) -> DataResult<Vec<String>> {
    codes.iter().map(|c| add_stock_suffix(c.as_ref())).collect()
}

pub fn get_stock_market_type(code: &str) -> DataResult<MarketType> {
    let symbol = add_stock_suffix(code)?;
    let number = symbol.split('.').next().unwrap_or_default();

    Ok(if number.starts_with("688") || number.starts_with("689") {
        MarketType::Star
    } else if number.starts_with("30") {
        MarketType::ChiNext
    } else if number.starts_with("83") {
        MarketType::Beijing
    } else {
        MarketType::Main
    })
}

fn starts_with_any(code: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| code.starts_with(p))
}
