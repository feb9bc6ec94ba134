use crate::cli::utils::{output_value, parse_filters, read_stdin_json};
use crate::cli::{CliContext, OutputFormat};

pub async fn list(
    ctx: &CliContext,
    resource: &str,
    sort: Option<&str>,
    filters: &[String],
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let criteria = parse_filters(filters)?;
    let rows = ctx.client.entity(resource).filter(criteria, sort).await?;
    output_value(output_format, &rows)
}

pub async fn get(ctx: &CliContext, resource: &str, id: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let rows = ctx.client.entity(resource).get(id).await?;
    output_value(output_format, &rows)
}

pub async fn create(ctx: &CliContext, resource: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let payload = read_stdin_json()?;
    let created = ctx.client.entity(resource).create(payload).await?;
    output_value(output_format, &created)
}

pub async fn update(ctx: &CliContext, resource: &str, id: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let payload = read_stdin_json()?;
    let updated = ctx.client.entity(resource).update(id, payload).await?;
    output_value(output_format, &updated)
}

pub async fn delete(ctx: &CliContext, resource: &str, id: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    ctx.client.entity(resource).delete(id).await?;
    crate::cli::utils::output_success(output_format, &format!("Deleted {} {}", resource, id), None)
}
