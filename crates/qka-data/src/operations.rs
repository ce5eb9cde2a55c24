//! Gateway registration of the market-data operations

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use qka_core::{
    operation_fn, Arguments, FunctionRegistry, InvocationError, OperationBuilder, ParamType,
    Returned, Table,
};
use qka_store::Bar;

use crate::calendar::{self, CalendarFormat};
use crate::error::{DataError, DataResult};
use crate::source::{MarketDataSource, SECTOR_ALL_A};
use crate::symbols::{self, MarketType};

/// Columns of every `get_daily_bars` table
pub const BAR_COLUMNS: [&str; 7] = ["time", "open", "high", "low", "close", "volume", "amount"];

/// Register every market-data operation.
///
/// Operations that touch `source` are serialized; the code helpers are pure
/// and run concurrently.
pub fn register_operations(
    registry: &mut FunctionRegistry,
    source: Arc<dyn MarketDataSource>,
) -> &mut FunctionRegistry {
    registry
        .register(
            OperationBuilder::new("add_stock_suffix")
                .describe("Append the exchange suffix to a 6-digit stock code")
                .param("stock_code", ParamType::String),
            operation_fn(|args: Arguments| async move {
                let code = symbols::add_stock_suffix(args.str("stock_code")?)?;
                Ok::<_, InvocationError>(Returned::from(code))
            }),
        )
        .register(
            OperationBuilder::new("add_stock_suffix_list")
                .describe("Append exchange suffixes to a list of stock codes")
                .param("stock_list", ParamType::Sequence),
            operation_fn(|args: Arguments| async move {
                let codes: Vec<String> = args.get("stock_list")?;
                Ok::<_, InvocationError>(Returned::from(symbols::add_stock_suffix_list(&codes)?))
            }),
        )
        .register(
            OperationBuilder::new("get_stock_market_type")
                .describe("Board a stock is listed on: 主板, 创业板, 科创板 or 北交所")
                .param("stock_code", ParamType::String),
            operation_fn(|args: Arguments| async move {
                let market = symbols::get_stock_market_type(args.str("stock_code")?)?;
                Ok::<_, InvocationError>(Returned::from(market.as_str()))
            }),
        );

    let src = source.clone();
    registry.register(
        OperationBuilder::new("get_trade_calendar")
            .describe("Trading days between two dates, inclusive")
            .param("start_time", ParamType::String)
            .param("end_time", ParamType::String)
            .param_or("format", ParamType::String, "number")
            .serialized(),
        operation_fn(move |args: Arguments| {
            let source = src.clone();
            async move {
                let start = args.str("start_time")?.to_string();
                let end = args.str("end_time")?.to_string();
                let format = CalendarFormat::parse(args.str("format")?)?;
                let days = blocking(move || {
                    let dates = source.trade_dates()?;
                    calendar::trade_calendar(&dates, &start, &end, format)
                })
                .await?;
                Ok::<_, InvocationError>(Returned::from(days))
            }
        }),
    );

    let src = source.clone();
    registry.register(
        OperationBuilder::new("get_stock_list_in_sector")
            .describe("Constituent codes of a sector such as 沪深A股")
            .param("sector_name", ParamType::String)
            .serialized(),
        operation_fn(move |args: Arguments| {
            let source = src.clone();
            async move {
                let sector = args.str("sector_name")?.to_string();
                let codes = blocking(move || source.sector_stocks(&sector)).await?;
                Ok::<_, InvocationError>(Returned::from(codes))
            }
        }),
    );

    let src = source.clone();
    registry.register(
        OperationBuilder::new("get_stock_list_in_main_board")
            .describe("Main-board constituents of 沪深A股")
            .serialized(),
        operation_fn(move |_| {
            let source = src.clone();
            async move {
                let codes = blocking(move || main_board(source.as_ref())).await?;
                Ok::<_, InvocationError>(Returned::from(codes))
            }
        }),
    );

    let src = source.clone();
    registry.register(
        OperationBuilder::new("download_stock_history_data")
            .describe("Fetch historical bars for each code")
            .param("stock_list", ParamType::Sequence)
            .param("start_time", ParamType::String)
            .param_or("end_time", ParamType::String, "")
            .param_or("period", ParamType::String, "1d")
            .param_or("process_bar", ParamType::Boolean, true)
            .serialized(),
        operation_fn(move |args: Arguments| {
            let source = src.clone();
            async move {
                let request = DownloadArgs::from_args(&args)?;
                blocking(move || download(source.as_ref(), &request)).await?;
                Ok::<_, InvocationError>(Returned::Bool(true))
            }
        }),
    );

    let src = source;
    registry.register(
        OperationBuilder::new("get_daily_bars")
            .describe("Bars per code as time, open, high, low, close, volume, amount")
            .param("stock_list", ParamType::Sequence)
            .param_or("period", ParamType::String, "1d")
            .param_or("start_time", ParamType::String, "")
            .param_or("end_time", ParamType::String, "")
            .param_or("count", ParamType::Integer, -1)
            .serialized(),
        operation_fn(move |args: Arguments| {
            let source = src.clone();
            async move {
                let codes: Vec<String> = args.get("stock_list")?;
                let period = args.str("period")?.to_string();
                let start = calendar::range_start(args.str("start_time")?)?;
                let end = calendar::range_end(args.str("end_time")?)?;
                let count = args.i64("count")?;

                let bars = blocking(move || {
                    let mut out = Vec::with_capacity(codes.len());
                    for code in symbols::add_stock_suffix_list(&codes)? {
                        let bars = source.market_data(&code, &period, start, end, count)?;
                        out.push((code, bar_rows(&bars)));
                    }
                    Ok(out)
                })
                .await?;
                Ok::<_, InvocationError>(Returned::map(bars))
            }
        }),
    );

    registry
}

/// Validated parameters of `download_stock_history_data`
#[derive(Debug)]
struct DownloadArgs {
    stock_list: Vec<String>,
    start_time: String,
    end_time: String,
    period: String,
    process_bar: bool,
}

impl DownloadArgs {
    fn from_args(args: &Arguments) -> Result<Self, InvocationError> {
        let request = Self {
            stock_list: args.get("stock_list")?,
            start_time: args.str("start_time")?.to_string(),
            end_time: args.str("end_time")?.to_string(),
            period: args.str("period")?.to_string(),
            process_bar: args.bool("process_bar")?,
        };
        if request.stock_list.is_empty() {
            return Err(DataError::InvalidArgument("stock list is empty".into()).into());
        }
        if request.start_time.is_empty() {
            return Err(DataError::InvalidArgument("start time must not be empty".into()).into());
        }
        if request.period.is_empty() {
            return Err(DataError::InvalidArgument("period must not be empty".into()).into());
        }
        Ok(request)
    }
}

fn download(source: &dyn MarketDataSource, request: &DownloadArgs) -> DataResult<()> {
    let pb = if request.process_bar {
        let pb = ProgressBar::new(request.stock_list.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.green/white}] {pos}/{len} {elapsed_precise}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message("下载历史数据");
        pb
    } else {
        ProgressBar::hidden()
    };

    for code in &request.stock_list {
        source.download_history(code, &request.period, &request.start_time, &request.end_time)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    tracing::info!(
        codes = request.stock_list.len(),
        period = %request.period,
        "History download finished"
    );
    Ok(())
}

fn main_board(source: &dyn MarketDataSource) -> DataResult<Vec<String>> {
    let mut codes = Vec::new();
    for code in source.sector_stocks(SECTOR_ALL_A)? {
        if symbols::get_stock_market_type(&code)? == MarketType::Main {
            codes.push(code);
        }
    }
    Ok(codes)
}

fn bar_rows(bars: &[Bar]) -> Table {
    let mut table = Table::new(BAR_COLUMNS);
    for bar in bars {
        table.push_row(vec![
            Returned::Int(bar.time),
            round2(bar.open).into(),
            round2(bar.high).into(),
            round2(bar.low).into(),
            round2(bar.close).into(),
            bar.volume.into(),
            bar.amount.into(),
        ]);
    }
    table
}

fn round2(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Run source access on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, InvocationError>
where
    F: FnOnce() -> DataResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| InvocationError::new(format!("market-data task failed: {}", e)))?
        .map_err(InvocationError::from)
}
