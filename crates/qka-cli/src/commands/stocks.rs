//! Symbol, sector and calendar commands

use anyhow::Result;
use qka_client::QkaClient;

use crate::output::{CodeRow, OutputContext};

pub async fn suffix(client: &QkaClient, ctx: &OutputContext, codes: &[String]) -> Result<()> {
    let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
    let suffixed = client.add_stock_suffix_list(&codes).await?;
    ctx.print_list(&suffixed);
    Ok(())
}

pub async fn market_type(client: &QkaClient, ctx: &OutputContext, code: &str) -> Result<()> {
    let board = client.get_stock_market_type(code).await?;
    let code = client.add_stock_suffix(code).await?;
    ctx.print(&[CodeRow { code, board }]);
    Ok(())
}

pub async fn sector(client: &QkaClient, ctx: &OutputContext, name: &str) -> Result<()> {
    let codes = client.get_stock_list_in_sector(name).await?;
    ctx.print_list(&codes);
    ctx.note(&format!("{} codes in {}", codes.len(), name));
    Ok(())
}

pub async fn main_board(client: &QkaClient, ctx: &OutputContext) -> Result<()> {
    let codes = client.get_stock_list_in_main_board().await?;
    ctx.print_list(&codes);
    ctx.note(&format!("{} main-board codes", codes.len()));
    Ok(())
}

pub async fn calendar(
    client: &QkaClient,
    ctx: &OutputContext,
    start: &str,
    end: &str,
    format: &str,
) -> Result<()> {
    let days = client.get_trade_calendar(start, end, format).await?;
    ctx.print_list(&days);
    Ok(())
}
