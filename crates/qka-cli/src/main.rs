//! qka-cli - Command-line client for a qka gateway

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

/// qka gateway command-line client
#[derive(Parser)]
#[command(name = "qka-cli", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Gateway base URL
    #[arg(short, long, env = "QKA_SERVER", global = true)]
    pub server: Option<String>,

    /// Shared secret printed by qkad at startup
    #[arg(short, long, env = "QKA_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (show request logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check gateway health
    Health,

    /// List the operations the gateway exposes
    Operations,

    /// Call any operation with JSON parameters
    Call {
        /// Operation name
        operation: String,

        /// Parameters as a JSON object
        #[arg(default_value = "{}")]
        params: String,
    },

    /// Append exchange suffixes to 6-digit codes
    Suffix {
        /// Stock codes
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Show the board a stock is listed on
    MarketType {
        /// Stock code
        code: String,
    },

    /// List the codes of a sector
    Sector {
        /// Sector name, e.g. 沪深A股
        name: String,
    },

    /// List main-board codes
    MainBoard,

    /// List trading days in a range
    Calendar {
        /// First day (YYYYMMDD)
        start: String,

        /// Last day (YYYYMMDD)
        end: String,

        /// Date format: number (YYYYMMDD) or str (YYYY-MM-DD)
        #[arg(short, long, default_value = "number")]
        format: String,
    },

    /// Show bars for one or more codes
    Bars {
        /// Stock codes
        #[arg(required = true)]
        codes: Vec<String>,

        /// Bar period
        #[arg(short, long, default_value = "1d")]
        period: String,

        /// Range start
        #[arg(long, default_value = "")]
        start: String,

        /// Range end
        #[arg(long, default_value = "")]
        end: String,

        /// Most recent N bars per code (-1 for all)
        #[arg(short = 'n', long, default_value_t = -1, allow_negative_numbers = true)]
        count: i64,
    },

    /// Ask the gateway to download history
    Download {
        /// Stock codes (omit with --main-board)
        codes: Vec<String>,

        /// Range start
        #[arg(long)]
        start: String,

        /// Range end
        #[arg(long, default_value = "")]
        end: String,

        /// Bar period
        #[arg(short, long, default_value = "1d")]
        period: String,

        /// Download every main-board code
        #[arg(long)]
        main_board: bool,

        /// Disable the server-side progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Daily job: download today's daily and minute bars for the main board
    Sync {
        /// Day to sync (YYYYMMDD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    if let Err(e) = run(cli, &ctx).await {
        ctx.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, ctx: &OutputContext) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let merged = config.merge_with_args(cli.server.as_deref(), cli.token.as_deref())?;
    let client = commands::connect(&merged)?;

    match cli.command {
        Commands::Health => commands::health(&client, ctx).await,
        Commands::Operations => commands::operations(&client, ctx).await,
        Commands::Call { operation, params } => {
            commands::call(&client, ctx, &operation, &params).await
        }
        Commands::Suffix { codes } => commands::suffix(&client, ctx, &codes).await,
        Commands::MarketType { code } => commands::market_type(&client, ctx, &code).await,
        Commands::Sector { name } => commands::sector(&client, ctx, &name).await,
        Commands::MainBoard => commands::main_board(&client, ctx).await,
        Commands::Calendar { start, end, format } => {
            commands::calendar(&client, ctx, &start, &end, &format).await
        }
        Commands::Bars {
            codes,
            period,
            start,
            end,
            count,
        } => commands::bars(&client, ctx, codes, &period, &start, &end, count).await,
        Commands::Download {
            codes,
            start,
            end,
            period,
            main_board,
            no_progress,
        } => {
            let args = commands::DownloadArgs {
                codes,
                start,
                end,
                period,
                main_board,
                progress: !no_progress,
            };
            commands::download(&client, ctx, args).await
        }
        Commands::Sync { date } => commands::sync(&client, ctx, date).await,
    }
}
