//! Bar retrieval

use anyhow::Result;
use chrono::DateTime;
use qka_client::{BarsRequest, DailyBar, QkaClient};

use crate::output::{BarRow, OutputContext};

pub async fn bars(
    client: &QkaClient,
    ctx: &OutputContext,
    codes: Vec<String>,
    period: &str,
    start: &str,
    end: &str,
    count: i64,
) -> Result<()> {
    let request = BarsRequest::new(codes)
        .period(period)
        .range(start, end)
        .count(count);
    let data = client.get_daily_bars(&request).await?;

    let mut codes: Vec<&String> = data.keys().collect();
    codes.sort();

    let rows: Vec<BarRow> = codes
        .into_iter()
        .flat_map(|code| data[code].iter().map(move |bar| bar_row(code, bar)))
        .collect();
    ctx.print(&rows);
    Ok(())
}

fn bar_row(code: &str, bar: &DailyBar) -> BarRow {
    BarRow {
        code: code.to_string(),
        time: format_time(bar.time),
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume,
        amount: bar.amount,
    }
}

/// Millisecond timestamps are shown as UTC wall time
fn format_time(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_millisecond_timestamps() {
        assert_eq!(format_time(1_704_153_600_000), "2024-01-02 00:00:00");
        assert_eq!(format_time(i64::MAX), i64::MAX.to_string());
    }
}
