use serde_json::json;

use crate::cli::utils::{output_success, read_stdin_line};
use crate::cli::{CliContext, OutputFormat};

pub async fn login(
    ctx: &CliContext,
    email: &str,
    password: Option<String>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let sessions = ctx.require_sessions()?;
    let password = match password {
        Some(password) => password,
        None => {
            eprint!("Password: ");
            read_stdin_line()?
        }
    };

    let session = sessions.sign_in(email, &password).await?;
    output_success(
        output_format,
        &format!("Signed in as {}", session.email.as_deref().unwrap_or(email)),
        Some(json!({ "email": session.email, "expires_at": session.expires_at })),
    )
}

pub async fn logout(ctx: &CliContext, output_format: &OutputFormat) -> anyhow::Result<()> {
    let sessions = ctx.require_sessions()?;
    if !sessions.sign_out().await {
        return output_success(output_format, "No active session", None);
    }
    output_success(output_format, "Signed out", None)
}

pub fn status(ctx: &CliContext, output_format: &OutputFormat) -> anyhow::Result<()> {
    let session = ctx.sessions.as_ref().and_then(|s| s.current());
    let static_token = ctx.client.config().static_token.is_some();

    match output_format {
        OutputFormat::Json => {
            let status = json!({
                "signed_in": session.is_some(),
                "email": session.as_ref().and_then(|s| s.email.clone()),
                "expires_at": session.as_ref().and_then(|s| s.expires_at),
                "static_token": static_token,
                "base_url": ctx.client.config().base_url,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Text => {
            println!("Gateway: {}", ctx.client.config().base_url);
            match &session {
                Some(session) => {
                    println!("Signed in as {}", session.email.as_deref().unwrap_or("(unknown)"));
                    if let Some(expires_at) = session.expires_at.and_then(|t| chrono::DateTime::from_timestamp(t, 0)) {
                        println!("Access token expires at {}", expires_at.to_rfc3339());
                    }
                }
                None => println!("Not signed in"),
            }
            if static_token {
                println!("Static API token configured");
            }
        }
    }
    Ok(())
}
