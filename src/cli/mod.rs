pub mod commands;
pub mod config;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ClientConfig, GoTrueSessionProvider, SessionManager};

#[derive(Parser)]
#[command(name = "oficina")]
#[command(about = "Oficina CLI - command-line client for the workshop gateway")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored session")]
    Logout,

    #[command(about = "Show the stored session")]
    Status,

    #[command(about = "Check gateway health")]
    Health,

    #[command(about = "List records of a resource")]
    List {
        #[arg(help = "Resource name (e.g. quotes, service-orders)")]
        resource: String,
        #[arg(long, help = "Sort column; prefix with - for descending")]
        sort: Option<String>,
        #[arg(long = "where", value_name = "COLUMN=VALUE", help = "Equality filter, repeatable")]
        filters: Vec<String>,
    },

    #[command(about = "Fetch one record by id")]
    Get {
        resource: String,
        id: String,
    },

    #[command(about = "Create a record from JSON on stdin")]
    Create {
        resource: String,
    },

    #[command(about = "Update a record from JSON on stdin")]
    Update {
        resource: String,
        id: String,
    },

    #[command(about = "Delete a record")]
    Delete {
        resource: String,
        id: String,
    },

    #[command(about = "Platform user administration")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Promote the signed-in user to admin if no admin exists yet")]
    Bootstrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Client wired with the stored session, when the auth service is configured.
pub struct CliContext {
    pub client: ApiClient,
    pub sessions: Option<SessionManager>,
}

impl CliContext {
    pub fn load() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env();
        let sessions = match (&config.auth_url, &config.auth_anon_key) {
            (Some(url), Some(key)) => {
                let provider = GoTrueSessionProvider::new(url, key, config.request_timeout)?;
                let stored = config::load_session()?;
                Some(SessionManager::new(Arc::new(provider), config.refresh_threshold).with_session(stored))
            }
            _ => None,
        };

        let mut client = ApiClient::new(config)?.with_login_surface(Arc::new(utils::CliSurface));
        if let Some(sessions) = &sessions {
            client = client.with_sessions(sessions.clone());
        }
        Ok(Self { client, sessions })
    }

    /// Write back whatever the session became (refreshed, signed out) during the command.
    pub fn persist(&self) -> anyhow::Result<()> {
        match self.sessions.as_ref().map(SessionManager::current) {
            Some(Some(session)) => config::save_session(&session),
            Some(None) => config::clear_session(),
            None => Ok(()),
        }
    }

    pub fn require_sessions(&self) -> anyhow::Result<&SessionManager> {
        self.sessions
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to sign in"))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::load()?;

    let result = match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password, &output_format).await,
        Commands::Logout => commands::auth::logout(&ctx, &output_format).await,
        Commands::Status => commands::auth::status(&ctx, &output_format),
        Commands::Health => commands::server::health(&ctx, &output_format).await,
        Commands::List { resource, sort, filters } => {
            commands::data::list(&ctx, &resource, sort.as_deref(), &filters, &output_format).await
        }
        Commands::Get { resource, id } => commands::data::get(&ctx, &resource, &id, &output_format).await,
        Commands::Create { resource } => commands::data::create(&ctx, &resource, &output_format).await,
        Commands::Update { resource, id } => commands::data::update(&ctx, &resource, &id, &output_format).await,
        Commands::Delete { resource, id } => commands::data::delete(&ctx, &resource, &id, &output_format).await,
        Commands::Users { cmd } => commands::users::handle(&ctx, cmd, &output_format).await,
        Commands::Bootstrap => commands::users::bootstrap(&ctx, &output_format).await,
    };

    ctx.persist()?;
    result
}
