//! Token-resilient client for the gateway.
//!
//! [`ApiClient`] issues requests with a bounded timeout, retries transport
//! failures with backoff and recovers from a 401 through one coalesced session
//! refresh. [`KeepAlive`] refreshes the session in the background so the
//! recovery path is rarely needed.

pub mod backoff;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod keepalive;
pub mod manager;
pub mod session;
pub mod surface;

pub use backoff::{Backoff, RetryPolicy};
pub use config::ClientConfig;
pub use engine::{ApiClient, RequestOptions};
pub use entity::EntityApi;
pub use error::{ClientError, ClientResult};
pub use keepalive::{KeepAlive, KeepAliveEvent};
pub use manager::SessionManager;
pub use session::{GoTrueSessionProvider, Session, SessionProvider};
pub use surface::{LogOnlySurface, LoginSurface};
