//! Request and response types for the market-data operations

use serde::{Deserialize, Serialize};

/// Parameters of `download_stock_history_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub stock_list: Vec<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_true")]
    pub process_bar: bool,
}

impl DownloadRequest {
    /// Daily bars from `start_time` up to now, with a progress bar
    pub fn new<I, S>(stock_list: I, start_time: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stock_list: stock_list.into_iter().map(Into::into).collect(),
            start_time: start_time.into(),
            end_time: String::new(),
            period: default_period(),
            process_bar: true,
        }
    }

    pub fn end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = end_time.into();
        self
    }

    pub fn period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    pub fn process_bar(mut self, enabled: bool) -> Self {
        self.process_bar = enabled;
        self
    }
}

/// Parameters of `get_daily_bars`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarsRequest {
    pub stock_list: Vec<String>,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Most recent N bars per code; `-1` for all
    #[serde(default = "default_count")]
    pub count: i64,
}

impl BarsRequest {
    pub fn new<I, S>(stock_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stock_list: stock_list.into_iter().map(Into::into).collect(),
            period: default_period(),
            start_time: String::new(),
            end_time: String::new(),
            count: default_count(),
        }
    }

    pub fn period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    pub fn range(mut self, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        self.start_time = start_time.into();
        self.end_time = end_time.into();
        self
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }
}

/// One row of a `get_daily_bars` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Millisecond timestamp
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

fn default_period() -> String {
    "1d".to_string()
}

fn default_true() -> bool {
    true
}

fn default_count() -> i64 {
    -1
}
