//! Generic operation call

use anyhow::{bail, Context, Result};
use qka_client::QkaClient;
use serde_json::Value;

use crate::output::OutputContext;

pub async fn call(client: &QkaClient, ctx: &OutputContext, operation: &str, params: &str) -> Result<()> {
    let params = parse_params(params)?;
    let data = client.call(operation, params).await?;
    ctx.print_value(&data);
    Ok(())
}

/// Parameters must be a JSON object keyed by parameter name
fn parse_params(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).context("Parameters are not valid JSON")?;
    if !value.is_object() {
        bail!("Parameters must be a JSON object, got: {}", raw);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_objects_only() {
        assert_eq!(
            parse_params(r#"{"stock_code": "600000"}"#).unwrap(),
            json!({"stock_code": "600000"})
        );
        assert!(parse_params("[1, 2]").is_err());
        assert!(parse_params("{not json").is_err());
    }
}
