use std::sync::Arc;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::database::{Store, StoreError, ID_COLUMN};
use crate::filter::SelectQuery;
use crate::types::{RequestContext, Verb};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("missing_id")]
    MissingId,

    #[error("invalid_body")]
    InvalidBody,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Executes CRUD calls against the collection behind a resource slug.
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn Store>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, ctx: RequestContext) -> Result<Value, ResourceError> {
        tracing::debug!(
            verb = ?ctx.verb,
            resource = %ctx.resource,
            id = ?ctx.id,
            "executing resource call"
        );

        match ctx.verb {
            Verb::List => self.list(&ctx).await,
            Verb::Get => self.get(&ctx).await,
            Verb::Create => self.create(ctx).await,
            Verb::Update => self.update(ctx).await,
            Verb::Delete => self.delete(&ctx).await,
        }
    }

    async fn list(&self, ctx: &RequestContext) -> Result<Value, ResourceError> {
        let query = SelectQuery {
            filters: ctx.filters.clone(),
            order: Some(ctx.sort.clone()),
            limit: None,
        };
        let rows = self.store.select(ctx.collection, &query).await?;
        Ok(Value::Array(rows))
    }

    /// Always an array of zero or one rows; an unknown id is not an error.
    async fn get(&self, ctx: &RequestContext) -> Result<Value, ResourceError> {
        let id = required_id(ctx)?;
        let query = SelectQuery::new().eq(ID_COLUMN, id).limit(1);
        let rows = self.store.select(ctx.collection, &query).await?;
        Ok(Value::Array(rows))
    }

    async fn create(&self, ctx: RequestContext) -> Result<Value, ResourceError> {
        let record = object_body(ctx.body)?;
        Ok(self.store.insert(ctx.collection, record).await?)
    }

    async fn update(&self, ctx: RequestContext) -> Result<Value, ResourceError> {
        let id = required_id(&ctx)?.to_string();
        let record = object_body(ctx.body)?;
        self.store
            .update(ctx.collection, ID_COLUMN, &id, record)
            .await?
            .ok_or(ResourceError::Store(StoreError::NoRows))
    }

    /// Idempotent: deleting a missing row still succeeds with `{}`.
    async fn delete(&self, ctx: &RequestContext) -> Result<Value, ResourceError> {
        let id = required_id(ctx)?;
        let removed = self.store.delete(ctx.collection, ID_COLUMN, id).await?;
        tracing::debug!("deleted {} row(s) from {}", removed, ctx.collection);
        Ok(json!({}))
    }
}

fn required_id(ctx: &RequestContext) -> Result<&str, ResourceError> {
    ctx.id.as_deref().filter(|id| !id.is_empty()).ok_or(ResourceError::MissingId)
}

fn object_body(body: Option<Value>) -> Result<Map<String, Value>, ResourceError> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        None => Ok(Map::new()),
        Some(_) => Err(ResourceError::InvalidBody),
    }
}
