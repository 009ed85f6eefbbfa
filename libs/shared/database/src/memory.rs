use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{matches_all, DocumentStore, Filter, OrderBy, StoreError};

/// Process-local store. Every write holds the single write lock, which makes the
/// check-then-write operations atomic.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn with_id(mut document: Value, id: &str) -> Value {
    if let Value::Object(map) = &mut document {
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
    document
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.insert_unique(collection, id, document, &[]).await
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        conflicts: &[Filter],
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.contains_key(id) {
            return Err(StoreError::Conflict(format!("{}/{} already exists", collection, id)));
        }

        if !conflicts.is_empty() && docs.values().any(|doc| matches_all(conflicts, doc)) {
            debug!("Unique insert into {} rejected by {:?}", collection, conflicts);
            return Err(StoreError::Conflict(format!(
                "a conflicting document already exists in {}",
                collection
            )));
        }

        docs.insert(id.to_string(), with_id(document, id));
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut results: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches_all(filters, doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            results.sort_by(|a, b| order.compare(a, b));
        }

        Ok(results)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: &[Filter],
    ) -> Result<Value, StoreError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        if !matches_all(guard, document) {
            return Err(StoreError::Conflict(format!(
                "{}/{} was modified concurrently",
                collection, id
            )));
        }

        let Value::Object(changes) = patch else {
            return Err(StoreError::Backend("update patch must be a JSON object".to_string()));
        };

        if let Value::Object(fields) = document {
            for (key, value) in changes {
                fields.insert(key, value);
            }
        }

        Ok(document.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }
}
