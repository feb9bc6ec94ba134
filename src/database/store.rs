use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{FilterError, SelectQuery};

/// Primary key column shared by every domain collection.
pub const ID_COLUMN: &str = "id";

/// Storage failures. The display string is what callers see, verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Message reported by the storage provider (constraint violations, bad casts, ...)
    #[error("{0}")]
    Provider(String),

    /// A single-row write matched no row
    #[error("JSON object requested, multiple (or no) rows returned")]
    NoRows,

    #[error(transparent)]
    Statement(#[from] FilterError),

    #[error("{0}")]
    Connection(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => StoreError::Provider(db.message().to_string()),
            sqlx::Error::RowNotFound => StoreError::NoRows,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Connection(err.to_string())
            }
            other => StoreError::Provider(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record-level access to the collections owned by the storage provider.
///
/// Records are opaque JSON objects. Each call is a single statement; the provider
/// is responsible for its own concurrency control.
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching every equality filter, in the requested order. Never `None`; empty is `[]`.
    async fn select(&self, collection: &str, query: &SelectQuery) -> StoreResult<Vec<Value>>;

    /// Insert one row and return it with generated columns populated.
    async fn insert(&self, collection: &str, record: Map<String, Value>) -> StoreResult<Value>;

    /// Update the row whose `key_column` equals `key`. `Ok(None)` when nothing matched.
    async fn update(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
        record: Map<String, Value>,
    ) -> StoreResult<Option<Value>>;

    /// Insert or replace keyed by `conflict_column`, atomically on the provider side.
    async fn upsert(&self, collection: &str, record: Map<String, Value>, conflict_column: &str) -> StoreResult<Value>;

    /// Delete rows whose `key_column` equals `key`; returns the number removed.
    async fn delete(&self, collection: &str, key_column: &str, key: &str) -> StoreResult<u64>;

    /// Cheap connectivity check.
    async fn ping(&self) -> StoreResult<()>;
}
