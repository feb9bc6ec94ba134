use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Row};

use crate::filter::{SelectQuery, Statement, SqlResult};

use super::store::{Store, StoreResult, ID_COLUMN};

/// `Store` backed by a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, sql: &SqlResult) -> StoreResult<Vec<Value>> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(Into::into))
            .collect()
    }

    async fn fetch_optional_row(&self, sql: &SqlResult) -> StoreResult<Option<Value>> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        match q.fetch_optional(&self.pool).await? {
            Some(row) => Ok(Some(row.try_get::<Value, _>("row")?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, collection: &str, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        let sql = Statement::new(collection)?.select(query)?;
        tracing::debug!(collection, sql = %sql.query, "select");
        self.fetch_rows(&sql).await
    }

    async fn insert(&self, collection: &str, record: Map<String, Value>) -> StoreResult<Value> {
        let sql = Statement::new(collection)?.insert(&record)?;
        let rows = self.fetch_rows(&sql).await?;
        rows.into_iter().next().ok_or(super::store::StoreError::NoRows)
    }

    async fn update(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
        record: Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        let statement = Statement::new(collection)?;
        if record.is_empty() {
            // Nothing to write; answer with the current row
            let query = SelectQuery::new().eq(key_column, key).limit(1);
            return Ok(self.fetch_rows(&statement.select(&query)?).await?.into_iter().next());
        }
        let sql = statement.update(key_column, key, &record)?;
        self.fetch_optional_row(&sql).await
    }

    async fn upsert(&self, collection: &str, record: Map<String, Value>, conflict_column: &str) -> StoreResult<Value> {
        let sql = Statement::new(collection)?.upsert(&record, conflict_column)?;
        self.fetch_optional_row(&sql)
            .await?
            .ok_or(super::store::StoreError::NoRows)
    }

    async fn delete(&self, collection: &str, key_column: &str, key: &str) -> StoreResult<u64> {
        let sql = Statement::new(collection)?.delete(key_column, key)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let done = q.execute(&self.pool).await?;
        if key_column == ID_COLUMN {
            tracing::debug!(collection, key, removed = done.rows_affected(), "delete by id");
        }
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Record bodies travel as a single JSONB parameter
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
