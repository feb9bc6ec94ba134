use serde_json::{Map, Value};

use super::error::FilterError;
use super::sort::validate_identifier;
use super::types::{SelectQuery, SqlResult};

/// Builds parameterized Postgres statements for one collection.
///
/// Every statement yields rows with a single `row` column holding the record as
/// JSON, so callers never hand-map columns. Writes go through
/// `jsonb_populate_record` and let Postgres coerce each value to its column type.
/// Predicates coerce the bound text the same way, so the column side stays
/// uncast and keeps its native comparison and index.
pub struct Statement {
    table: String,
}

impl Statement {
    pub fn new(table: impl Into<String>) -> Result<Self, FilterError> {
        let table = table.into();
        validate_identifier(&table).map_err(|_| FilterError::InvalidTableName(table.clone()))?;
        Ok(Self { table })
    }

    pub fn select(&self, query: &SelectQuery) -> Result<SqlResult, FilterError> {
        let mut params = Vec::new();
        let mut conditions = Vec::new();
        for filter in &query.filters {
            validate_identifier(&filter.column)?;
            params.push(Value::String(filter.value.clone()));
            conditions.push(format!("t.\"{}\" = {}", filter.column, self.coerced(&filter.column, params.len())));
        }

        let mut parts = vec![format!("SELECT row_to_json(t) AS row FROM \"{}\" AS t", self.table)];
        if !conditions.is_empty() {
            parts.push(format!("WHERE {}", conditions.join(" AND ")));
        }
        if let Some(order) = &query.order {
            validate_identifier(&order.column)?;
            parts.push(format!("ORDER BY t.\"{}\" {}", order.column, order.direction.to_sql()));
        }
        if let Some(limit) = query.limit {
            parts.push(format!("LIMIT {}", limit.max(0)));
        }

        Ok(SqlResult { query: parts.join(" "), params })
    }

    pub fn insert(&self, record: &Map<String, Value>) -> Result<SqlResult, FilterError> {
        if record.is_empty() {
            return Ok(SqlResult {
                query: format!("INSERT INTO \"{}\" AS r DEFAULT VALUES RETURNING row_to_json(r) AS row", self.table),
                params: vec![],
            });
        }

        let columns = Self::columns(record)?;
        let query = format!(
            "INSERT INTO \"{table}\" AS r ({cols}) SELECT {picked} FROM jsonb_populate_record(NULL::\"{table}\", $1::jsonb) AS p RETURNING row_to_json(r) AS row",
            table = self.table,
            cols = Self::quoted(&columns),
            picked = Self::picked(&columns),
        );
        Ok(SqlResult { query, params: vec![Value::Object(record.clone())] })
    }

    pub fn update(&self, key_column: &str, key: &str, record: &Map<String, Value>) -> Result<SqlResult, FilterError> {
        validate_identifier(key_column)?;
        let columns = Self::columns(record)?;
        if columns.is_empty() {
            return Err(FilterError::InvalidBody("update requires at least one column".to_string()));
        }

        let assignments = columns
            .iter()
            .map(|c| format!("\"{c}\" = p.\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE \"{table}\" AS r SET {assignments} FROM jsonb_populate_record(NULL::\"{table}\", $1::jsonb) AS p WHERE r.\"{key_column}\" = {key} RETURNING row_to_json(r) AS row",
            table = self.table,
            key = self.coerced(key_column, 2),
        );
        Ok(SqlResult {
            query,
            params: vec![Value::Object(record.clone()), Value::String(key.to_string())],
        })
    }

    pub fn upsert(&self, record: &Map<String, Value>, conflict_column: &str) -> Result<SqlResult, FilterError> {
        validate_identifier(conflict_column)?;
        let columns = Self::columns(record)?;
        if !columns.iter().any(|c| c == conflict_column) {
            return Err(FilterError::InvalidBody(format!("upsert requires '{}'", conflict_column)));
        }

        let assignments = columns
            .iter()
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "INSERT INTO \"{table}\" AS r ({cols}) SELECT {picked} FROM jsonb_populate_record(NULL::\"{table}\", $1::jsonb) AS p ON CONFLICT (\"{conflict_column}\") DO UPDATE SET {assignments} RETURNING row_to_json(r) AS row",
            table = self.table,
            cols = Self::quoted(&columns),
            picked = Self::picked(&columns),
        );
        Ok(SqlResult { query, params: vec![Value::Object(record.clone())] })
    }

    pub fn delete(&self, key_column: &str, key: &str) -> Result<SqlResult, FilterError> {
        validate_identifier(key_column)?;
        Ok(SqlResult {
            query: format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = {}",
                self.table,
                key_column,
                self.coerced(key_column, 1)
            ),
            params: vec![Value::String(key.to_string())],
        })
    }

    /// Text parameter `$n` converted to the declared type of `column`.
    fn coerced(&self, column: &str, n: usize) -> String {
        format!(
            "(jsonb_populate_record(NULL::\"{table}\", jsonb_build_object('{column}', ${n}::text))).\"{column}\"",
            table = self.table,
        )
    }

    fn columns(record: &Map<String, Value>) -> Result<Vec<String>, FilterError> {
        record
            .keys()
            .map(|k| validate_identifier(k).map(|_| k.clone()))
            .collect()
    }

    fn quoted(columns: &[String]) -> String {
        columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
    }

    fn picked(columns: &[String]) -> String {
        columns.iter().map(|c| format!("p.\"{}\"", c)).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::SortSpec;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Statement::new("quotes").is_ok());
        assert!(matches!(Statement::new("quotes; --"), Err(FilterError::InvalidTableName(_))));
    }

    #[test]
    fn select_with_filters_order_and_limit() {
        let query = SelectQuery::new()
            .eq("status", "open")
            .eq("customer_id", "7")
            .order(SortSpec::descending("created_date"))
            .limit(1);
        let sql = Statement::new("quotes").unwrap().select(&query).unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"quotes\" AS t \
             WHERE t.\"status\" = (jsonb_populate_record(NULL::\"quotes\", jsonb_build_object('status', $1::text))).\"status\" \
             AND t.\"customer_id\" = (jsonb_populate_record(NULL::\"quotes\", jsonb_build_object('customer_id', $2::text))).\"customer_id\" \
             ORDER BY t.\"created_date\" DESC LIMIT 1"
        );
        assert_eq!(sql.params, vec![json!("open"), json!("7")]);
    }

    #[test]
    fn select_rejects_injected_columns() {
        let query = SelectQuery::new().eq("x\" OR 1=1 --", "a");
        assert!(Statement::new("quotes").unwrap().select(&query).is_err());

        let query = SelectQuery::new().order(SortSpec::ascending("total desc"));
        assert!(Statement::new("quotes").unwrap().select(&query).is_err());
    }

    #[test]
    fn insert_lists_only_supplied_columns() {
        let sql = Statement::new("customers")
            .unwrap()
            .insert(&object(json!({ "name": "Ana", "phone": null })))
            .unwrap();
        assert!(sql.query.starts_with("INSERT INTO \"customers\" AS r (\"name\", \"phone\") SELECT p.\"name\", p.\"phone\""));
        assert!(sql.query.ends_with("RETURNING row_to_json(r) AS row"));
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn empty_insert_uses_default_values() {
        let sql = Statement::new("customers").unwrap().insert(&Map::new()).unwrap();
        assert!(sql.query.contains("DEFAULT VALUES"));
        assert!(sql.params.is_empty());
    }

    #[test]
    fn update_binds_body_then_key() {
        let sql = Statement::new("quotes")
            .unwrap()
            .update("id", "abc", &object(json!({ "total": 10 })))
            .unwrap();
        assert!(sql.query.contains("SET \"total\" = p.\"total\""));
        assert!(sql.query.contains(
            "WHERE r.\"id\" = (jsonb_populate_record(NULL::\"quotes\", jsonb_build_object('id', $2::text))).\"id\""
        ));
        assert_eq!(sql.params[1], json!("abc"));
    }

    #[test]
    fn upsert_requires_conflict_column() {
        let stmt = Statement::new("profiles").unwrap();
        assert!(stmt.upsert(&object(json!({ "role": "admin" })), "user_id").is_err());
        let sql = stmt
            .upsert(&object(json!({ "user_id": "u1", "role": "admin" })), "user_id")
            .unwrap();
        assert!(sql.query.contains("ON CONFLICT (\"user_id\") DO UPDATE SET"));
        assert!(sql.query.contains("\"role\" = EXCLUDED.\"role\""));
    }

    #[test]
    fn delete_by_key() {
        let sql = Statement::new("quotes").unwrap().delete("id", "q-1").unwrap();
        assert_eq!(
            sql.query,
            "DELETE FROM \"quotes\" WHERE \"id\" = (jsonb_populate_record(NULL::\"quotes\", jsonb_build_object('id', $1::text))).\"id\""
        );
        assert_eq!(sql.params, vec![json!("q-1")]);
    }

    #[test]
    fn predicates_never_cast_the_column() {
        let stmt = Statement::new("quotes").unwrap();
        let select = stmt.select(&SelectQuery::new().eq("total", "150").eq("created_date", "2024-01-01T00:00:00Z")).unwrap();
        let update = stmt.update("id", "42", &object(json!({ "status": "sent" }))).unwrap();
        let delete = stmt.delete("id", "42").unwrap();

        for sql in [&select, &update, &delete] {
            assert!(!sql.query.contains("\"::text"), "column cast in {}", sql.query);
        }
        assert!(select.query.contains("t.\"total\" = (jsonb_populate_record(NULL::\"quotes\""));
        assert_eq!(select.params, vec![json!("150"), json!("2024-01-01T00:00:00Z")]);
    }
}
