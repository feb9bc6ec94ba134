use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::database::{ProfileRepository, StoreError};

use super::role::Role;
use super::secret::SharedSecret;
use super::AuthProvider;

/// Verified human caller. `role` is only ever filled from the profile collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Resolved caller of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    /// Presented the shared secret; trusted automation, no identity lookup
    Service,
    User(Identity),
}

impl Caller {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Caller::Service => None,
            Caller::User(identity) => Some(&identity.user_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        match self {
            Caller::Service => true,
            Caller::User(identity) => identity.role == Some(Role::Admin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingToken,
    InvalidToken,
    ProfileError,
    NotAdmin,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingToken => "missing_token",
            Rejection::InvalidToken => "invalid_token",
            Rejection::ProfileError => "profile_error",
            Rejection::NotAdmin => "not_admin",
        }
    }
}

/// Where a verified user's role comes from. Never the request itself.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, StoreError>;
}

#[async_trait]
impl RoleSource for ProfileRepository {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.find(user_id).await?.and_then(|p| p.role()))
    }
}

/// Credential presented in the `Authorization` header.
enum Credential<'a> {
    SharedSecret,
    AccessToken(&'a str),
}

/// Extract the token from `Authorization: Bearer <token>`; blank tokens count as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Resolves who is calling and what they may do.
///
/// Capabilities come from exactly two places: the shared secret (service caller)
/// and a [`RoleSource`] keyed by the verified user id. Request bodies and other
/// headers are never consulted.
#[derive(Clone)]
pub struct AuthGate {
    secret: Option<SharedSecret>,
    provider: Arc<dyn AuthProvider>,
    roles: Arc<dyn RoleSource>,
}

impl AuthGate {
    pub fn new(secret: Option<SharedSecret>, provider: Arc<dyn AuthProvider>, roles: Arc<dyn RoleSource>) -> Self {
        Self { secret, provider, roles }
    }

    fn credential<'a>(&self, headers: &'a HeaderMap) -> Result<Credential<'a>, Rejection> {
        let token = bearer_token(headers).ok_or(Rejection::MissingToken)?;
        match &self.secret {
            Some(secret) if secret.matches(token) => Ok(Credential::SharedSecret),
            _ => Ok(Credential::AccessToken(token)),
        }
    }

    async fn verify(&self, token: &str) -> Result<Identity, Rejection> {
        match self.provider.get_user(token).await {
            Ok(user) => Ok(Identity { user_id: user.id, email: user.email, role: None }),
            Err(e) => {
                tracing::warn!("token verification failed: {}", e);
                Err(Rejection::InvalidToken)
            }
        }
    }

    async fn with_profile_role(&self, mut identity: Identity) -> Result<Identity, Rejection> {
        identity.role = self.roles.role_of(&identity.user_id).await.map_err(|e| {
            tracing::warn!("profile lookup failed for {}: {}", identity.user_id, e);
            Rejection::ProfileError
        })?;
        Ok(identity)
    }

    /// Domain resources: the shared secret or any valid access token. Roles are not checked.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, Rejection> {
        let result = match self.credential(headers) {
            Ok(Credential::SharedSecret) => Ok(Caller::Service),
            Ok(Credential::AccessToken(token)) => self.verify(token).await.map(Caller::User),
            Err(rejection) => Err(rejection),
        };
        if let Err(rejection) = &result {
            tracing::warn!("request rejected: {}", rejection.reason());
        }
        result
    }

    /// Admin surface: the shared secret, or a valid token whose profile holds the admin role.
    pub async fn authorize_admin(&self, headers: &HeaderMap) -> Result<Caller, Rejection> {
        let result = match self.credential(headers) {
            Ok(Credential::SharedSecret) => Ok(Caller::Service),
            Ok(Credential::AccessToken(token)) => {
                let identity = self.with_profile_role(self.verify(token).await?).await?;
                if identity.role == Some(Role::Admin) {
                    Ok(Caller::User(identity))
                } else {
                    Err(Rejection::NotAdmin)
                }
            }
            Err(rejection) => Err(rejection),
        };
        if let Err(rejection) = &result {
            tracing::warn!("admin request rejected: {}", rejection.reason());
        }
        result
    }

    /// A verified human user; the shared secret carries no user id and is refused here.
    pub async fn identify_user(&self, headers: &HeaderMap) -> Result<Identity, Rejection> {
        let token = bearer_token(headers).ok_or(Rejection::MissingToken)?;
        self.verify(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn service_callers_are_admins() {
        assert!(Caller::Service.is_admin());
        let user = Caller::User(Identity { user_id: "u".into(), email: None, role: Some(Role::Manager) });
        assert!(!user.is_admin());
        assert_eq!(user.user_id(), Some("u"));
    }

    #[test]
    fn rejection_reasons() {
        assert_eq!(Rejection::MissingToken.reason(), "missing_token");
        assert_eq!(Rejection::NotAdmin.reason(), "not_admin");
    }
}
