use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use oficina_api::auth::{GoTrueProvider, SharedSecret};
use oficina_api::config::{self, AuthConfig};
use oficina_api::database::DatabaseManager;
use oficina_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    let default_filter = if config.server.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting Oficina API in {:?} mode", config.environment);

    let store = DatabaseManager::open(&config.database)
        .await
        .context("failed to open the configured store")?;
    store.ping().await.context("store is unreachable")?;
    let provider = auth_provider(&config.auth)?;
    let shared_secret = SharedSecret::new(config.auth.shared_secret.as_deref());
    if shared_secret.is_some() {
        tracing::info!("Shared-secret service access enabled");
    }

    let state = AppState::new(store, Arc::new(provider), shared_secret)
        .with_body_limit(config.server.max_request_size_bytes);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Oficina API listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await.context("server error")?;
    Ok(())
}

fn auth_provider(auth: &AuthConfig) -> anyhow::Result<GoTrueProvider> {
    let url = auth.url.as_deref().context("SUPABASE_URL is required")?;
    let service_key = match auth.service_key.as_deref() {
        Some(key) => key,
        None => {
            tracing::warn!("SUPABASE_SERVICE_ROLE_KEY not set; admin user management will fail");
            ""
        }
    };
    let provider = GoTrueProvider::new(url, service_key, Duration::from_secs(auth.provider_timeout_secs))?
        .with_jwt_secret(auth.jwt_secret.as_deref());
    Ok(provider)
}
