use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, AuthProvider, Identity, NewAccount, Role};
use crate::database::models::Profile;
use crate::database::{ProfileRepository, StoreError};
use crate::resources::normalize_payload;

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum UserError {
    /// Input rejected before any side effect; the code is the client-facing message
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated admin request to create a platform user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl CreateUser {
    /// Validate a raw request body. Empty strings count as absent.
    pub fn from_body(raw: Value) -> Result<Self, UserError> {
        let body = normalize_payload(raw);
        let email = text_field(&body, "email").trim().to_lowercase();
        let password = text_field(&body, "password");
        let full_name = Some(text_field(&body, "full_name")).filter(|n| !n.is_empty());
        let role = text_field(&body, "role").to_lowercase();

        if email.is_empty() {
            return Err(UserError::Validation("missing_email"));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(UserError::Validation("invalid_password_min_8_chars"));
        }
        let role = if role.is_empty() {
            Role::default()
        } else {
            role.parse().map_err(|_| UserError::Validation("invalid_role"))?
        };

        Ok(Self { email, password, full_name, role })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapOutcome {
    pub promoted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Platform users: an auth-provider account paired with a profile row.
///
/// Both halves are created and removed as one unit; when the second step fails
/// the first is compensated.
#[derive(Clone)]
pub struct UserService {
    provider: Arc<dyn AuthProvider>,
    profiles: ProfileRepository,
}

impl UserService {
    pub fn new(provider: Arc<dyn AuthProvider>, profiles: ProfileRepository) -> Self {
        Self { provider, profiles }
    }

    pub async fn create(&self, request: CreateUser) -> Result<CreatedUser, UserError> {
        let account = NewAccount {
            email: request.email.clone(),
            password: request.password,
            full_name: request.full_name.clone(),
            role: request.role,
        };
        let user = self.provider.create_user(&account).await?;
        if user.id.is_empty() {
            return Err(UserError::Validation("user_creation_failed"));
        }

        let profile = Profile::new(user.id.clone(), request.full_name, request.role);
        if let Err(e) = self.profiles.upsert(&profile).await {
            tracing::warn!("profile upsert failed for {}, removing account: {}", user.id, e);
            if let Err(rollback) = self.provider.delete_user(&user.id).await {
                tracing::error!("failed to roll back account {}: {}", user.id, rollback);
            }
            return Err(e.into());
        }

        tracing::info!("created user {} with role {}", user.id, request.role);
        Ok(CreatedUser {
            id: user.id,
            email: request.email,
            role: request.role,
        })
    }

    pub async fn list(&self) -> Result<Vec<Profile>, UserError> {
        Ok(self.profiles.list().await?)
    }

    /// Remove the profile first, then the account; restore the profile if the account survives.
    pub async fn delete(&self, user_id: &str) -> Result<(), UserError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(UserError::Validation("missing_user_id"));
        }

        let snapshot = self.profiles.find(user_id).await?;
        self.profiles.delete(user_id).await?;

        if let Err(e) = self.provider.delete_user(user_id).await {
            tracing::warn!("account removal failed for {}: {}", user_id, e);
            if let Some(profile) = snapshot {
                if let Err(restore) = self.profiles.upsert(&profile).await {
                    tracing::error!("failed to restore profile {}: {}", user_id, restore);
                }
            }
            return Err(e.into());
        }

        tracing::info!("deleted user {}", user_id);
        Ok(())
    }

    /// Promote the caller to admin while no admin exists yet.
    ///
    /// The check and the upsert are separate statements; two concurrent first
    /// callers may both be promoted, and the upsert keeps the last write.
    pub async fn bootstrap(&self, identity: &Identity) -> Result<BootstrapOutcome, UserError> {
        if self.profiles.any_admin().await? {
            return Ok(BootstrapOutcome { promoted: false, reason: Some("admin_exists") });
        }
        self.profiles.upsert_role(&identity.user_id, Role::Admin).await?;
        tracing::info!("bootstrapped {} as the first admin", identity.user_id);
        Ok(BootstrapOutcome { promoted: true, reason: None })
    }
}

/// Read a field as text the way a loosely typed form would: numbers and booleans
/// are stringified, null and missing read as empty.
pub(crate) fn text_field(body: &Value, key: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
