/// Where a signed-out user is sent to authenticate again.
pub trait LoginSurface: Send + Sync {
    /// True when the user is already looking at the login surface; no redirect then.
    fn is_active(&self) -> bool {
        false
    }

    fn redirect(&self);
}

/// Surface for non-interactive callers: the forced sign-out is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlySurface;

impl LoginSurface for LogOnlySurface {
    fn redirect(&self) {
        tracing::warn!("session ended; sign in again to continue");
    }
}
