use serde::{Deserialize, Serialize};

/// Column used when a listing carries no `sort` parameter.
pub const DEFAULT_SORT_COLUMN: &str = "created_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Asc }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Desc }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Asc
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::descending(DEFAULT_SORT_COLUMN)
    }
}

/// Equality filter: column and an opaque string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEq {
    pub column: String,
    pub value: String,
}

impl FilterEq {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self { column: column.into(), value: value.into() }
    }
}

/// Read query against one collection.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub filters: Vec<FilterEq>,
    pub order: Option<SortSpec>,
    pub limit: Option<i64>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterEq::new(column, value));
        self
    }

    pub fn order(mut self, sort: SortSpec) -> Self {
        self.order = Some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
