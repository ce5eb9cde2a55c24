//! Gateway introspection commands

use anyhow::Result;
use qka_client::{OperationDescriptor, QkaClient};

use crate::output::{OperationRow, OutputContext};

pub async fn health(client: &QkaClient, ctx: &OutputContext) -> Result<()> {
    let status = client.health().await?;
    ctx.success(&format!("{} is healthy: {}", client.base_url(), status.trim()));
    Ok(())
}

pub async fn operations(client: &QkaClient, ctx: &OutputContext) -> Result<()> {
    let descriptors = client.list_operations().await?;
    let rows: Vec<OperationRow> = descriptors.iter().map(operation_row).collect();
    ctx.print(&rows);
    Ok(())
}

fn operation_row(desc: &OperationDescriptor) -> OperationRow {
    let parameters = desc
        .parameters
        .iter()
        .map(|p| match p.default() {
            Some(default) => format!("{}: {} = {}", p.name(), p.param_type(), default),
            None => format!("{}: {}", p.name(), p.param_type()),
        })
        .collect::<Vec<_>>()
        .join(", ");

    OperationRow {
        name: desc.name.clone(),
        parameters,
        serialized: if desc.serialized { "yes" } else { "no" }.to_string(),
        description: desc.description.clone().unwrap_or_default(),
    }
}
