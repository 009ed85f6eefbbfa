use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use shared_database::{
    store::{from_document, from_documents, to_document},
    DocumentStore, OrderBy, StoreError,
};
use shared_models::collections::LAWYERS_COLLECTION;

use crate::models::LawyerAvailability;

/// Typed access to the `lawyers` collection.
#[derive(Clone)]
pub struct LawyerRepository {
    store: Arc<dyn DocumentStore>,
}

impl LawyerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, lawyer_id: &str) -> Result<Option<LawyerAvailability>, StoreError> {
        match self.store.get(LAWYERS_COLLECTION, lawyer_id).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<LawyerAvailability>, StoreError> {
        let documents = self.store
            .query(LAWYERS_COLLECTION, &[], Some(&OrderBy::desc("createdAt")))
            .await?;
        debug!("Loaded {} lawyers", documents.len());
        from_documents(documents)
    }

    pub async fn insert(&self, lawyer: &LawyerAvailability) -> Result<(), StoreError> {
        self.store
            .insert(LAWYERS_COLLECTION, &lawyer.id, to_document(lawyer)?)
            .await
    }

    pub async fn update(&self, lawyer_id: &str, patch: Value) -> Result<LawyerAvailability, StoreError> {
        let updated = self.store.update(LAWYERS_COLLECTION, lawyer_id, patch, &[]).await?;
        from_document(updated)
    }

    pub async fn delete(&self, lawyer_id: &str) -> Result<bool, StoreError> {
        self.store.delete(LAWYERS_COLLECTION, lawyer_id).await
    }
}
