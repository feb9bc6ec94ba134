#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use serde_json::{json, Value};

use oficina_api::auth::SharedSecret;
use oficina_api::database::{MemoryStore, Store, PROFILES_COLLECTION};
use oficina_api::testing::{FaultyStore, StubAuthProvider};
use oficina_api::{router, AppState};

pub const SHARED_SECRET: &str = "automation-secret";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_ID: &str = "admin-1";
pub const USER_TOKEN: &str = "user-token";
pub const USER_ID: &str = "user-1";

/// Serve a router on a free local port; returns `http://127.0.0.1:<port>`.
pub async fn serve(app: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Gateway running in-process over a memory store and a stub auth provider.
pub struct TestApp {
    pub base_url: String,
    pub store: MemoryStore,
    pub faults: Arc<FaultyStore>,
    pub provider: Arc<StubAuthProvider>,
    pub http: reqwest::Client,
}

impl TestApp {
    /// Two known tokens: `ADMIN_TOKEN` (profile role admin) and `USER_TOKEN` (operator).
    pub async fn spawn() -> Result<Self> {
        Self::launch(None).await
    }

    /// Same as [`TestApp::spawn`] with a request body cap of `bytes`.
    pub async fn spawn_with_body_limit(bytes: usize) -> Result<Self> {
        Self::launch(Some(bytes)).await
    }

    async fn launch(body_limit: Option<usize>) -> Result<Self> {
        let store = MemoryStore::new();
        let faults = Arc::new(FaultyStore::new(Arc::new(store.clone())));
        let provider = Arc::new(
            StubAuthProvider::new()
                .with_user(ADMIN_TOKEN, ADMIN_ID)
                .with_user(USER_TOKEN, USER_ID),
        );

        let mut state = AppState::new(
            faults.clone() as Arc<dyn Store>,
            provider.clone(),
            SharedSecret::new(Some(SHARED_SECRET)),
        );
        if let Some(bytes) = body_limit {
            state = state.with_body_limit(bytes);
        }
        let base_url = serve(router(state)).await?;

        Ok(Self {
            base_url,
            store,
            faults,
            provider,
            http: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn seed_profile(&self, user_id: &str, role: &str) {
        self.store
            .seed(PROFILES_COLLECTION, vec![json!({ "user_id": user_id, "full_name": null, "role": role })])
            .await;
    }

    /// Seed the default admin and operator profiles.
    pub async fn seed_default_profiles(&self) {
        self.seed_profile(ADMIN_ID, "admin").await;
        self.seed_profile(USER_ID, "operator").await;
    }

    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(reqwest::StatusCode, Value)> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("non-JSON body: {}", text))?
        };
        Ok((status, value))
    }
}
