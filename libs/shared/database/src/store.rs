// libs/shared/database/src/store.rs
use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Field holding a document's identifier in every collection.
pub const ID_FIELD: &str = "id";

// ==============================================================================
// QUERY MODEL
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn as_postgrest(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, document: &Value) -> bool {
        let actual = document.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Gte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_postgrest(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Field predicates plus an ordered list of sort keys.
///
/// Stores that cannot sort server-side return documents in unspecified order
/// when `order_by` is empty; callers that need an order must ask for it or
/// sort on their side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub filters: Vec<Filter>,
    pub order_by: Vec<(String, SortDirection)>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn where_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn where_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by.push((field.to_string(), direction));
        self
    }

    fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }

    /// Compare two documents by the query's sort keys.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, direction) in &self.order_by {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ordering = sort_order(left, right);
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Render as a PostgREST query string (no leading `?`).
    pub fn to_postgrest(&self) -> String {
        let mut query_parts: Vec<String> = self
            .filters
            .iter()
            .map(|filter| {
                format!(
                    "{}={}.{}",
                    filter.field,
                    filter.op.as_postgrest(),
                    urlencoding::encode(&render_value(&filter.value))
                )
            })
            .collect();

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(field, direction)| format!("{}.{}", field, direction.as_postgrest()))
                .collect::<Vec<_>>()
                .join(",");
            query_parts.push(format!("order={}", order));
        }

        query_parts.join("&")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strings compare lexically, numbers numerically; mixed types are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn sort_order(a: &Value, b: &Value) -> Ordering {
    compare_values(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

/// Read a document's identifier, accepting numeric keys from SQL-backed stores.
pub fn document_id(document: &Value) -> Option<String> {
    match document.get(ID_FIELD)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

// ==============================================================================
// STORE SEAM
// ==============================================================================

/// Schema-less, collection-addressed document storage.
///
/// Documents are JSON objects; every document returned carries its
/// identifier under [`ID_FIELD`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return the identifier the store assigned.
    async fn insert(&self, collection: &str, document: Value) -> Result<String>;

    /// `Ok(None)` when no document has this identifier.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    async fn query(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Value>>;

    /// Merge `fields` into an existing document. Fails if the target is missing.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
