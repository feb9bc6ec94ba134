use crate::cli::utils::output_value;
use crate::cli::{CliContext, OutputFormat};
use crate::client::RequestOptions;

pub async fn health(ctx: &CliContext, output_format: &OutputFormat) -> anyhow::Result<()> {
    let health = ctx.client.get("/health", RequestOptions::default()).await?;
    output_value(output_format, &health)
}
