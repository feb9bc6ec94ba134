use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ClientError, ClientResult};

/// Tokens issued by the auth service. Owned by the [`SessionManager`](super::SessionManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds; `None` when the service did not say
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    /// True when the access token expires within `threshold` of `now` (unix seconds).
    pub fn expires_within(&self, threshold: Duration, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= threshold.as_secs() as i64,
            None => false,
        }
    }
}

/// Network side of the session lifecycle.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> ClientResult<Session>;

    /// Revoke the session server-side.
    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<Value>,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));
        let email = token
            .user
            .as_ref()
            .and_then(|u| u.get("email"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            email,
        }
    }
}

/// Password and refresh-token grants against the hosted auth service (`/auth/v1`).
#[derive(Clone)]
pub struct GoTrueSessionProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueSessionProvider {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    async fn grant(&self, grant_type: &str, payload: Value) -> ClientResult<Session> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ClientError::Auth(auth_message(&body).unwrap_or_else(|| status.to_string())));
        }
        serde_json::from_value::<TokenResponse>(body)
            .map(Session::from)
            .map_err(|_| ClientError::InvalidJson)
    }
}

fn auth_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl SessionProvider for GoTrueSessionProvider {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.grant("password", json!({ "email": email, "password": password })).await
    }

    async fn refresh(&self, refresh_token: &str) -> ClientResult<Session> {
        self.grant("refresh_token", json!({ "refresh_token": refresh_token })).await
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Auth(format!("logout failed: {}", response.status())));
        }
        Ok(())
    }
}
