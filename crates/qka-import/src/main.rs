//! qka-import - load CSV bar exports into the qka store
//!
//! Usage:
//!   qka-import [OPTIONS] [import.toml]
//!
//! Every `.csv` under the source directory is cleaned and appended to the
//! target table. A file that fails is logged and skipped.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use qka_store::{csv_files, import_csv_file, validate_table, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ImportConfig;

#[derive(Parser)]
#[command(name = "qka-import")]
#[command(version, about = "Import CSV bar exports into the qka store")]
struct Args {
    /// Config file (TOML)
    config: Option<PathBuf>,

    /// Directory of CSV files
    #[arg(long)]
    source: Option<PathBuf>,

    /// Store database path
    #[arg(long)]
    target: Option<PathBuf>,

    /// Destination table
    #[arg(long)]
    table: Option<String>,

    /// Rows per insert transaction
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qka_import=info,qka_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };
    if args.source.is_some() {
        config.source.path = args.source;
    }
    if let Some(target) = args.target {
        config.target.path = target;
    }
    if let Some(table) = args.table {
        config.target.table = table;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.target.chunk_size = chunk_size;
    }

    validate_table(&config.target.table)?;
    let source_dir = config.source_dir()?;
    let files = csv_files(source_dir);
    tracing::info!(
        source = %source_dir.display(),
        files = files.len(),
        table = %config.target.table,
        "Starting import"
    );

    let mut store = Store::open(&config.target.path)
        .with_context(|| format!("Failed to open store: {}", config.target.path.display()))?;

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} {wide_bar} {pos}/{len} [{elapsed}]")
        {
            bar.set_style(style);
        }
        bar.set_message("导入CSV文件进度");
        bar
    };

    let mut rows = 0;
    let mut failed = 0;
    for path in &files {
        match import_csv_file(&mut store, &config.target.table, path, config.target.chunk_size) {
            Ok(count) => rows += count,
            Err(e) => {
                failed += 1;
                progress.suspend(|| {
                    tracing::error!(path = %path.display(), error = %e, "Failed to import file");
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    tracing::info!(files = files.len(), failed, rows, "Import finished");
    Ok(())
}
