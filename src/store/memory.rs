//! In-process document store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::store::{Document, DocumentStore, Filter, StoreError};

/// Document store held in process memory, one vector per collection.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    collections: DashMap<String, Vec<Document>>,
    closed: AtomicBool,
    reachable: AtomicBool,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: DashMap::new(),
            closed: AtomicBool::new(false),
            reachable: AtomicBool::new(true),
        }
    }

    /// Make subsequent probes fail as if the backing server went away.
    pub fn disconnect(&self) {
        self.reachable.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            Err(StoreError::Closed(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unreachable(self.name.clone()))
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::warn!(store = %self.name, "Multiple close() called");
            return;
        }
        tracing::info!(store = %self.name, "Store connection closed");
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<String, StoreError> {
        self.ensure_open()?;
        let id = Uuid::new_v4().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                body,
            });
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_open()?;
        if Uuid::parse_str(id).is_err() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(&doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        body: Value,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter_mut().find(|doc| filter.matches(&doc.body)) {
            Some(doc) => {
                doc.body = body;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
