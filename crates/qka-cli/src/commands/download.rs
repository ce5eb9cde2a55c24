//! History download and the daily sync job

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use qka_client::{DownloadRequest, QkaClient};

use crate::output::OutputContext;

/// Periods fetched by `sync`, in order
pub const SYNC_PERIODS: [&str; 2] = ["1d", "1m"];

pub struct DownloadArgs {
    pub codes: Vec<String>,
    pub start: String,
    pub end: String,
    pub period: String,
    pub main_board: bool,
    pub progress: bool,
}

pub async fn download(client: &QkaClient, ctx: &OutputContext, args: DownloadArgs) -> Result<()> {
    let codes = if args.main_board {
        client.get_stock_list_in_main_board().await?
    } else {
        args.codes
    };
    if codes.is_empty() {
        bail!("No stock codes given; pass codes or --main-board");
    }

    let total = codes.len();
    let request = DownloadRequest::new(codes, args.start)
        .end_time(args.end)
        .period(args.period)
        .process_bar(args.progress);

    let spinner = spinner(ctx, &format!("Downloading {} codes ({})", total, request.period));
    let result = client.download_stock_history_data(&request).await;
    spinner.finish_and_clear();

    if result? {
        ctx.success(&format!("Downloaded {} codes ({})", total, request.period));
    } else {
        ctx.error("Gateway reported the download as unsuccessful");
    }
    Ok(())
}

/// Download one day of main-board bars for every sync period
pub async fn sync(client: &QkaClient, ctx: &OutputContext, date: Option<String>) -> Result<()> {
    let date = match date {
        Some(date) => validate_date(&date)?,
        None => Local::now().format("%Y%m%d").to_string(),
    };

    let codes = client.get_stock_list_in_main_board().await?;
    ctx.info(&format!("Syncing {} main-board codes for {}", codes.len(), date));
    if codes.is_empty() {
        ctx.info("Nothing to sync");
        return Ok(());
    }

    for period in SYNC_PERIODS {
        let request = DownloadRequest::new(codes.clone(), date.clone())
            .end_time(date.clone())
            .period(period)
            .process_bar(false);

        let spinner = spinner(ctx, &format!("Downloading {} bars", period));
        let result = client.download_stock_history_data(&request).await;
        spinner.finish_and_clear();
        result?;

        tracing::info!(period, date = %date, "Sync step finished");
        ctx.success(&format!("{} bars downloaded", period));
    }
    Ok(())
}

fn validate_date(date: &str) -> Result<String> {
    match NaiveDate::parse_from_str(date, "%Y%m%d") {
        Ok(_) => Ok(date.to_string()),
        Err(_) => bail!("Invalid date '{}', expected YYYYMMDD", date),
    }
}

fn spinner(ctx: &OutputContext, message: &str) -> ProgressBar {
    if ctx.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
