use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::{document_id, DocumentQuery, DocumentStore, ID_FIELD};

/// Process-local document store used when no hosted database is configured.
///
/// Documents keep insertion order within a collection; queries without sort
/// keys return them in that order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under a caller-chosen identifier, replacing any existing one.
    pub async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let mut fields = into_object(document)?;
        fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        documents.retain(|doc| document_id(doc).as_deref() != Some(id));
        documents.push(Value::Object(fields));
        Ok(())
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn into_object(document: Value) -> Result<Map<String, Value>> {
    match document {
        Value::Object(fields) => Ok(fields),
        other => Err(anyhow!("Documents must be JSON objects, got {}", other)),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<String> {
        let mut fields = into_object(document)?;
        let id = Uuid::new_v4().to_string();
        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(Value::Object(fields));

        debug!("Inserted {} document {}", collection, id);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| document_id(doc).as_deref() == Some(id)))
            .cloned())
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut matching: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
            .unwrap_or_default();

        if !query.order_by.is_empty() {
            matching.sort_by(|a, b| query.compare(a, b));
        }

        debug!("Query on {} matched {} documents", collection, matching.len());
        Ok(matching)
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| document_id(doc).as_deref() == Some(id)))
            .ok_or_else(|| anyhow!("Resource not found: no {} document with id {}", collection, id))?;

        if let Value::Object(existing) = document {
            for (key, value) in fields {
                // identifiers are immutable once assigned
                if key != ID_FIELD {
                    existing.insert(key, value);
                }
            }
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.retain(|doc| document_id(doc).as_deref() != Some(id));
        }
        Ok(())
    }
}
