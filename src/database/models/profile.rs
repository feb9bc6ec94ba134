use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Authorization attributes of a platform user, keyed by the auth provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>, full_name: Option<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            full_name,
            role: Some(role.as_str().to_string()),
        }
    }

    /// Parsed role; unknown or missing roles carry no privileges.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}
