use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

/// Field predicate used for queries, uniqueness checks and update guards.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::Neq, value: value.into() }
    }

    /// A missing field compares as `null`.
    pub fn matches(&self, document: &Value) -> bool {
        let actual = document.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => *actual == self.value,
            FilterOp::Neq => *actual != self.value,
        }
    }
}

pub fn matches_all(filters: &[Filter], document: &Value) -> bool {
    filters.iter().all(|filter| filter.matches(document))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: false }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: true }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let left = a.get(&self.field).unwrap_or(&Value::Null);
        let right = b.get(&self.field).unwrap_or(&Value::Null);
        let ordering = compare_values(left, right);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

// RFC 3339 timestamps in a single format sort correctly as strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Generic JSON document store: one namespace per collection, documents keyed by id.
///
/// `insert_unique` and guarded `update` are atomic with respect to other writers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fails with `Conflict` when the id is taken.
    async fn insert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    /// Inserts only if no document in the collection matches every filter in
    /// `conflicts`; otherwise fails with `Conflict` and writes nothing.
    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        conflicts: &[Filter],
    ) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Shallow-merges `patch` into the document when every `guard` matches the
    /// stored version. Missing document is `NotFound`, failed guard is `Conflict`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: &[Filter],
    ) -> Result<Value, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

pub fn to_document<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(record)?)
}

pub fn from_document<T: DeserializeOwned>(document: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}

pub fn from_documents<T: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<T>, StoreError> {
    documents.into_iter().map(from_document).collect()
}
