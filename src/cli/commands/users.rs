use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, output_value, read_stdin_line};
use crate::cli::{CliContext, OutputFormat};
use crate::client::RequestOptions;

const USERS_PATH: &str = "/admin/users";

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List platform users and their roles")]
    List,

    #[command(about = "Create a platform user")]
    Create {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Full name")]
        full_name: Option<String>,
        #[arg(long, help = "admin, manager or operator (default operator)")]
        role: Option<String>,
    },

    #[command(about = "Delete a platform user and its profile")]
    Delete {
        #[arg(help = "User id")]
        user_id: String,
    },
}

pub async fn handle(ctx: &CliContext, cmd: UserCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users = ctx.client.get(USERS_PATH, RequestOptions::default()).await?;
            output_value(output_format, &users)
        }
        UserCommands::Create { email, password, full_name, role } => {
            let password = match password {
                Some(password) => password,
                None => {
                    eprint!("Password: ");
                    read_stdin_line()?
                }
            };
            let body = json!({
                "email": email,
                "password": password,
                "full_name": full_name,
                "role": role,
            });
            let created = ctx.client.post(USERS_PATH, RequestOptions::default().body(body)).await?;
            output_value(output_format, &created)
        }
        UserCommands::Delete { user_id } => {
            let body = json!({ "user_id": user_id });
            ctx.client.delete(USERS_PATH, RequestOptions::default().body(body)).await?;
            output_success(output_format, &format!("Deleted user {}", user_id), None)
        }
    }
}

pub async fn bootstrap(ctx: &CliContext, output_format: &OutputFormat) -> anyhow::Result<()> {
    let outcome = ctx.client.post("/admin/bootstrap", RequestOptions::default()).await?;
    output_value(output_format, &outcome)
}
