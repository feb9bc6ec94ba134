//! Caller identity: token verification, account administration and the request gate.

pub mod claims;
pub mod gate;
pub mod gotrue;
pub mod role;
pub mod secret;

pub use claims::{Claims, JwtVerifier};
pub use gate::{bearer_token, AuthGate, Caller, Identity, Rejection, RoleSource};
pub use gotrue::GoTrueProvider;
pub use role::Role;
pub use secret::SharedSecret;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Message reported by the auth provider, surfaced verbatim
    #[error("{0}")]
    Provider(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Account as known to the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Account creation request; the email is confirmed on creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl NewAccount {
    pub(crate) fn metadata(&self) -> Value {
        serde_json::json!({
            "full_name": self.full_name,
            "role": self.role.as_str(),
        })
    }
}

/// External authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the account behind an access token.
    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError>;

    async fn create_user(&self, account: &NewAccount) -> Result<AuthUser, AuthError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), AuthError>;
}
