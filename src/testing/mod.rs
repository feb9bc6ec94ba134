//! In-process stand-ins for the auth service, the session service and the
//! login surface, plus a store wrapper that fails on demand.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider, AuthUser, NewAccount};
use crate::client::{ClientError, ClientResult, LoginSurface, Session, SessionProvider};
use crate::database::{Store, StoreError, StoreResult};
use crate::filter::SelectQuery;

/// Auth provider backed by a token table. Counts every call.
#[derive(Default)]
pub struct StubAuthProvider {
    tokens: Mutex<HashMap<String, AuthUser>>,
    accounts: Mutex<HashMap<String, NewAccount>>,
    get_user_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
}

impl StubAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as the access token of user `id`.
    pub fn with_user(self, token: &str, id: &str) -> Self {
        self.add_user(token, id);
        self
    }

    pub fn add_user(&self, token: &str, id: &str) {
        let user = AuthUser { id: id.to_string(), email: Some(format!("{}@oficina.test", id)) };
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner).insert(token.to_string(), user);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Ids of the accounts currently registered.
    pub fn account_ids(&self) -> Vec<String> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    pub fn account(&self, id: &str) -> Option<NewAccount> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner).get(id).cloned()
    }

    /// Register an account directly, as if created earlier.
    pub fn insert_account(&self, id: &str, account: NewAccount) {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner).insert(id.to_string(), account);
    }
}

#[async_trait]
impl AuthProvider for StubAuthProvider {
    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("invalid JWT".to_string()))
    }

    async fn create_user(&self, account: &NewAccount) -> Result<AuthUser, AuthError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fail_create.load(Ordering::SeqCst) || accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::Provider(
                "A user with this email address has already been registered".to_string(),
            ));
        }
        let id = Uuid::new_v4().to_string();
        accounts.insert(id.clone(), account.clone());
        Ok(AuthUser { id, email: Some(account.email.clone()) })
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("Database error deleting user".to_string()));
        }
        match self.accounts.lock().unwrap_or_else(PoisonError::into_inner).remove(user_id) {
            Some(_) => Ok(()),
            None => Err(AuthError::Provider("User not found".to_string())),
        }
    }
}

/// Session service issuing `token-1`, `token-2`, ... on each successful refresh.
#[derive(Default)]
pub struct StubSessionProvider {
    refresh_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl StubSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every refresh takes this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every refresh and sign-in is refused.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for StubSessionProvider {
    async fn sign_in(&self, email: &str, _password: &str) -> ClientResult<Session> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ClientError::Auth("Invalid login credentials".to_string()));
        }
        Ok(Session {
            access_token: "token-0".to_string(),
            refresh_token: "refresh-0".to_string(),
            expires_at: None,
            email: Some(email.to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> ClientResult<Session> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(ClientError::Auth("Invalid Refresh Token".to_string()));
        }
        Ok(Session {
            access_token: format!("token-{}", n),
            refresh_token: format!("refresh-{}", n),
            expires_at: None,
            email: None,
        })
    }

    async fn sign_out(&self, _access_token: &str) -> ClientResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Login surface that records redirects.
#[derive(Default)]
pub struct RecordingSurface {
    active: AtomicBool,
    redirects: AtomicUsize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the user is already on the login surface.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl LoginSurface for RecordingSurface {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn redirect(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store wrapper whose writes or reads can be made to fail.
pub struct FaultyStore {
    inner: Arc<dyn Store>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Provider("permission denied for table".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn select(&self, collection: &str, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        self.check(&self.fail_reads)?;
        self.inner.select(collection, query).await
    }

    async fn insert(&self, collection: &str, record: Map<String, Value>) -> StoreResult<Value> {
        self.check(&self.fail_writes)?;
        self.inner.insert(collection, record).await
    }

    async fn update(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
        record: Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        self.check(&self.fail_writes)?;
        self.inner.update(collection, key_column, key, record).await
    }

    async fn upsert(&self, collection: &str, record: Map<String, Value>, conflict_column: &str) -> StoreResult<Value> {
        self.check(&self.fail_writes)?;
        self.inner.upsert(collection, record, conflict_column).await
    }

    async fn delete(&self, collection: &str, key_column: &str, key: &str) -> StoreResult<u64> {
        self.check(&self.fail_writes)?;
        self.inner.delete(collection, key_column, key).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check(&self.fail_reads)?;
        self.inner.ping().await
    }
}
