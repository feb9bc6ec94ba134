use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::auth::Role;
use crate::filter::SelectQuery;

use super::models::Profile;
use super::store::{Store, StoreError, StoreResult};

/// Collection holding one profile per platform user.
pub const PROFILES_COLLECTION: &str = "profiles";
const USER_ID_COLUMN: &str = "user_id";
const ROLE_COLUMN: &str = "role";

/// Profile lookups and writes on top of the generic store.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn Store>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let query = SelectQuery::new().eq(USER_ID_COLUMN, user_id).limit(1);
        let rows = self.store.select(PROFILES_COLLECTION, &query).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// True when at least one profile holds the admin role.
    pub async fn any_admin(&self) -> StoreResult<bool> {
        let query = SelectQuery::new().eq(ROLE_COLUMN, Role::Admin.as_str()).limit(1);
        Ok(!self.store.select(PROFILES_COLLECTION, &query).await?.is_empty())
    }

    pub async fn list(&self) -> StoreResult<Vec<Profile>> {
        self.store
            .select(PROFILES_COLLECTION, &SelectQuery::new())
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Insert or replace the whole profile, keyed by user id.
    pub async fn upsert(&self, profile: &Profile) -> StoreResult<Profile> {
        let record = match serde_json::to_value(profile) {
            Ok(Value::Object(map)) => map,
            _ => return Err(StoreError::Provider("profile is not an object".to_string())),
        };
        decode(self.store.upsert(PROFILES_COLLECTION, record, USER_ID_COLUMN).await?)
    }

    /// Set only the role, leaving other profile columns untouched.
    pub async fn upsert_role(&self, user_id: &str, role: Role) -> StoreResult<Profile> {
        let mut record = Map::new();
        record.insert(USER_ID_COLUMN.to_string(), json!(user_id));
        record.insert(ROLE_COLUMN.to_string(), json!(role.as_str()));
        decode(self.store.upsert(PROFILES_COLLECTION, record, USER_ID_COLUMN).await?)
    }

    pub async fn delete(&self, user_id: &str) -> StoreResult<u64> {
        self.store.delete(PROFILES_COLLECTION, USER_ID_COLUMN, user_id).await
    }
}

fn decode(row: Value) -> StoreResult<Profile> {
    serde_json::from_value(row).map_err(|e| StoreError::Provider(format!("malformed profile row: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;

    fn repo() -> (MemoryStore, ProfileRepository) {
        let store = MemoryStore::new();
        let repo = ProfileRepository::new(Arc::new(store.clone()));
        (store, repo)
    }

    #[tokio::test]
    async fn finds_profiles_by_user_id() {
        let (_, repo) = repo();
        assert!(repo.find("u1").await.unwrap().is_none());
        repo.upsert(&Profile::new("u1", Some("Ana".into()), Role::Manager)).await.unwrap();
        let found = repo.find("u1").await.unwrap().unwrap();
        assert_eq!(found.role(), Some(Role::Manager));
        assert_eq!(found.full_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn upsert_role_keeps_full_name() {
        let (_, repo) = repo();
        repo.upsert(&Profile::new("u1", Some("Ana".into()), Role::Operator)).await.unwrap();
        let updated = repo.upsert_role("u1", Role::Admin).await.unwrap();
        assert!(updated.is_admin());
        assert_eq!(updated.full_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn any_admin_tracks_roles() {
        let (store, repo) = repo();
        assert!(!repo.any_admin().await.unwrap());
        store.seed(PROFILES_COLLECTION, vec![json!({ "user_id": "x", "role": "admin" })]).await;
        assert!(repo.any_admin().await.unwrap());
    }

    #[tokio::test]
    async fn unknown_roles_carry_no_privileges() {
        let (store, repo) = repo();
        store.seed(PROFILES_COLLECTION, vec![json!({ "user_id": "x", "role": "superuser" })]).await;
        let profile = repo.find("x").await.unwrap().unwrap();
        assert_eq!(profile.role(), None);
        assert!(!profile.is_admin());
    }
}
