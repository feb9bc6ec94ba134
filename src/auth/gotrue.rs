use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use crate::types::encode_path_segment;

use super::claims::JwtVerifier;
use super::{AuthError, AuthProvider, AuthUser, NewAccount};

/// Client for the hosted auth service's REST API (`/auth/v1`).
#[derive(Clone)]
pub struct GoTrueProvider {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    verifier: Option<JwtVerifier>,
}

impl GoTrueProvider {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            verifier: None,
        })
    }

    /// Verify access tokens locally instead of calling `/auth/v1/user`.
    pub fn with_jwt_secret(mut self, secret: Option<&str>) -> Self {
        self.verifier = secret.filter(|s| !s.is_empty()).map(JwtVerifier::new);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn user_url(&self, user_id: &str) -> String {
        self.url(&format!("/admin/users/{}", encode_path_segment(user_id)))
    }

    fn admin(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Pull the human-readable message out of an auth-service error body.
fn provider_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("auth provider responded {}", status))
}

async fn into_error(response: Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AuthError::Provider(provider_message(status, &body))
}

/// Admin endpoints answer either the user object or `{ "user": {...} }`.
fn user_from(body: Value) -> Option<AuthUser> {
    let user = body.get("user").cloned().unwrap_or(body);
    serde_json::from_value::<AuthUser>(user).ok().filter(|u| !u.id.is_empty())
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if let Some(verifier) = &self.verifier {
            return verifier.verify(token);
        }

        let response = self
            .http
            .get(self.url("/user"))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::InvalidToken(provider_message(status, &body)));
        }
        let body: Value = response.json().await?;
        user_from(body).ok_or_else(|| AuthError::InvalidToken("no user in response".to_string()))
    }

    async fn create_user(&self, account: &NewAccount) -> Result<AuthUser, AuthError> {
        let payload = json!({
            "email": account.email,
            "password": account.password,
            "email_confirm": true,
            "user_metadata": account.metadata(),
        });
        let response = self
            .admin(self.http.post(self.url("/admin/users")))
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(into_error(response).await);
        }
        let body: Value = response.json().await?;
        user_from(body).ok_or_else(|| AuthError::Provider("user_creation_failed".to_string()))
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        let response = self
            .admin(self.http.delete(self.user_url(user_id)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(into_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_provider_messages() {
        let msg = provider_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code":422,"msg":"A user with this email address has already been registered"}"#);
        assert_eq!(msg, "A user with this email address has already been registered");
        let msg = provider_message(StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#);
        assert_eq!(msg, "Invalid Refresh Token");
        let msg = provider_message(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(msg, "auth provider responded 502 Bad Gateway");
    }

    #[test]
    fn reads_wrapped_and_bare_users() {
        assert_eq!(user_from(json!({ "id": "u1", "email": "a@b.c" })).unwrap().id, "u1");
        assert_eq!(user_from(json!({ "user": { "id": "u2" } })).unwrap().id, "u2");
        assert!(user_from(json!({ "id": "" })).is_none());
        assert!(user_from(json!({})).is_none());
    }

    #[test]
    fn user_ids_are_encoded_into_the_admin_path() {
        let provider = GoTrueProvider::new("https://auth.example/", "service", Duration::from_secs(1)).unwrap();
        assert_eq!(
            provider.user_url("7f3c 9/x"),
            "https://auth.example/auth/v1/admin/users/7f3c%209%2Fx"
        );
    }

    #[tokio::test]
    async fn local_verification_skips_the_network() {
        use crate::auth::claims::Claims;

        // Unroutable base URL: any network call would fail
        let provider = GoTrueProvider::new("http://127.0.0.1:9", "service", Duration::from_millis(50))
            .unwrap()
            .with_jwt_secret(Some("jwt-secret"));
        let token = JwtVerifier::new("jwt-secret")
            .sign(&Claims::new("user-9", None, chrono::Duration::minutes(1)))
            .unwrap();
        assert_eq!(provider.get_user(&token).await.unwrap().id, "user-9");
    }
}
