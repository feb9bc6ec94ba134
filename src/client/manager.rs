use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};

use super::error::ClientResult;
use super::session::{Session, SessionProvider};

type PendingRefresh = Shared<BoxFuture<'static, Option<Session>>>;

/// Owns the current session and serializes every refresh through one slot.
///
/// At most one refresh call is in flight at any instant. Callers arriving while
/// one is pending await the same result. The slot is filled by the first
/// caller and emptied once that refresh settles.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn SessionProvider>,
    session: RwLock<Option<Session>>,
    pending: Mutex<Option<(u64, PendingRefresh)>>,
    next_refresh_id: AtomicU64,
    refresh_threshold: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn current(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn take(&self) -> Option<Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner).take()
    }

    async fn run_refresh(self: Arc<Self>, id: u64) -> Option<Session> {
        let result = match self.current() {
            None => {
                tracing::debug!("no session to refresh");
                None
            }
            Some(session) => match self.provider.refresh(&session.refresh_token).await {
                Ok(fresh) => {
                    self.replace(Some(fresh.clone()));
                    tracing::debug!("session refreshed");
                    Some(fresh)
                }
                Err(e) => {
                    tracing::warn!("session refresh failed: {}", e);
                    None
                }
            },
        };

        let mut pending = lock(&self.pending);
        if matches!(pending.as_ref(), Some((current, _)) if *current == id) {
            *pending = None;
        }
        result
    }
}

impl SessionManager {
    pub fn new(provider: Arc<dyn SessionProvider>, refresh_threshold: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                session: RwLock::new(None),
                pending: Mutex::new(None),
                next_refresh_id: AtomicU64::new(1),
                refresh_threshold,
            }),
        }
    }

    /// Start from a previously persisted session.
    pub fn with_session(self, session: Option<Session>) -> Self {
        self.inner.replace(session);
        self
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.current()
    }

    pub fn has_session(&self) -> bool {
        self.current().is_some()
    }

    /// True while a refresh is pending in the slot.
    pub fn refresh_in_flight(&self) -> bool {
        lock(&self.inner.pending).is_some()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        let session = self.inner.provider.sign_in(email, password).await?;
        self.inner.replace(Some(session.clone()));
        Ok(session)
    }

    /// Drop the local session and revoke it remotely. Remote failures are logged only.
    ///
    /// Returns whether this call cleared a session; concurrent callers race for
    /// it and exactly one wins.
    pub async fn sign_out(&self) -> bool {
        let Some(session) = self.inner.take() else {
            return false;
        };
        if let Err(e) = self.inner.provider.sign_out(&session.access_token).await {
            tracing::warn!("remote sign-out failed: {}", e);
        }
        true
    }

    /// Refresh the session, joining any refresh already in flight.
    ///
    /// The refresh runs on its own task: a caller giving up (timeout, drop) does
    /// not cancel it for the others. `None` means no session or the refresh failed.
    pub async fn refresh(&self) -> Option<Session> {
        let pending = {
            let mut slot = lock(&self.inner.pending);
            match slot.as_ref() {
                Some((_, pending)) => pending.clone(),
                None => {
                    let id = self.inner.next_refresh_id.fetch_add(1, Ordering::Relaxed);
                    let task = tokio::spawn(self.inner.clone().run_refresh(id));
                    let pending = async move { task.await.ok().flatten() }.boxed().shared();
                    *slot = Some((id, pending.clone()));
                    pending
                }
            }
        };
        pending.await
    }

    /// Current access token, refreshed first when it is about to expire.
    ///
    /// Falls back to the existing token when the pre-emptive refresh fails; the
    /// server then has the final word.
    pub async fn access_token(&self) -> Option<String> {
        let session = self.current()?;
        if session.expires_within(self.inner.refresh_threshold, Utc::now().timestamp()) {
            if let Some(fresh) = self.refresh().await {
                return Some(fresh.access_token);
            }
        }
        Some(session.access_token)
    }
}
