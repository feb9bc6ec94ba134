use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filter::{validate_identifier, FilterEq, SelectQuery, SortSpec, Statement};

use super::store::{Store, StoreError, StoreResult, ID_COLUMN};

/// Column stamped on insert when the caller did not provide one.
pub const CREATED_COLUMN: &str = "created_date";

type Collections = HashMap<String, Vec<Map<String, Value>>>;

/// In-process `Store` for local development and tests.
///
/// Follows the Postgres backend's observable behavior: generated `id` and
/// `created_date`, text-equality filters, `NULLS LAST` ascending and
/// `NULLS FIRST` descending ordering.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows directly, bypassing generated columns.
    pub async fn seed(&self, collection: &str, rows: Vec<Value>) {
        let mut guard = self.collections.write().await;
        let table = guard.entry(collection.to_string()).or_default();
        table.extend(rows.into_iter().filter_map(|r| match r {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    pub async fn rows(&self, collection: &str) -> Vec<Value> {
        let guard = self.collections.read().await;
        guard
            .get(collection)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn check_names(collection: &str, record: &Map<String, Value>) -> StoreResult<()> {
        Statement::new(collection)?;
        for key in record.keys() {
            validate_identifier(key)?;
        }
        Ok(())
    }

    fn stamp_generated(record: &mut Map<String, Value>) {
        if record.get(ID_COLUMN).map_or(true, Value::is_null) {
            record.insert(ID_COLUMN.to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if record.get(CREATED_COLUMN).map_or(true, Value::is_null) {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
            record.insert(CREATED_COLUMN.to_string(), Value::String(now));
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Compares the way a typed column would: numbers by value, timestamps by instant.
fn matches(row: &Map<String, Value>, filter: &FilterEq) -> bool {
    match row.get(&filter.column) {
        None | Some(Value::Null) => false,
        Some(Value::Number(n)) => match (n.as_f64(), filter.value.trim().parse::<f64>()) {
            (Some(x), Ok(y)) => x == y,
            _ => n.to_string() == filter.value,
        },
        Some(Value::String(s)) => {
            s == &filter.value
                || matches!(
                    (DateTime::parse_from_rfc3339(s), DateTime::parse_from_rfc3339(&filter.value)),
                    (Ok(a), Ok(b)) if a == b
                )
        }
        Some(other) => as_text(other).map_or(false, |text| text == filter.value),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Ascending comparison with nulls sorting last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_rows(rows: &mut [Map<String, Value>], sort: &SortSpec) {
    let null = Value::Null;
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&sort.column).unwrap_or(&null), b.get(&sort.column).unwrap_or(&null));
        if sort.is_ascending() { ord } else { ord.reverse() }
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, collection: &str, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        // Validation mirrors the SQL backend so both reject the same input
        Statement::new(collection)?.select(query)?;

        let guard = self.collections.read().await;
        let mut rows: Vec<Map<String, Value>> = guard
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(guard);

        if let Some(sort) = &query.order {
            sort_rows(&mut rows, sort);
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, collection: &str, mut record: Map<String, Value>) -> StoreResult<Value> {
        Self::check_names(collection, &record)?;
        Self::stamp_generated(&mut record);

        let mut guard = self.collections.write().await;
        let table = guard.entry(collection.to_string()).or_default();
        let id = record.get(ID_COLUMN).cloned();
        if table.iter().any(|row| row.get(ID_COLUMN) == id.as_ref()) {
            return Err(StoreError::Provider(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                collection
            )));
        }
        table.push(record.clone());
        Ok(Value::Object(record))
    }

    async fn update(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
        record: Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        Self::check_names(collection, &record)?;
        validate_identifier(key_column)?;

        let filter = FilterEq::new(key_column, key);
        let mut guard = self.collections.write().await;
        let Some(row) = guard
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|row| matches(row, &filter)))
        else {
            return Ok(None);
        };
        row.extend(record);
        Ok(Some(Value::Object(row.clone())))
    }

    async fn upsert(&self, collection: &str, record: Map<String, Value>, conflict_column: &str) -> StoreResult<Value> {
        Self::check_names(collection, &record)?;
        let key = record
            .get(conflict_column)
            .and_then(as_text)
            .ok_or_else(|| StoreError::Provider(format!("null value in column \"{}\"", conflict_column)))?;

        let filter = FilterEq::new(conflict_column, key);
        let mut guard = self.collections.write().await;
        let table = guard.entry(collection.to_string()).or_default();
        if let Some(row) = table.iter_mut().find(|row| matches(row, &filter)) {
            row.extend(record);
            return Ok(Value::Object(row.clone()));
        }

        let mut record = record;
        Self::stamp_generated(&mut record);
        table.push(record.clone());
        Ok(Value::Object(record))
    }

    async fn delete(&self, collection: &str, key_column: &str, key: &str) -> StoreResult<u64> {
        Statement::new(collection)?;
        validate_identifier(key_column)?;

        let filter = FilterEq::new(key_column, key);
        let mut guard = self.collections.write().await;
        let Some(rows) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, &filter));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
