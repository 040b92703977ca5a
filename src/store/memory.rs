//! In-process document store

use super::eval;
use super::{SearchRequest, SearchResponse, StoreClient};
use crate::error::StoreError;
use crate::result::RawHit;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// Collections of JSON documents held in memory, ordered by id.
///
/// Unknown collections behave as empty ones.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&self, collection: &str, id: impl Into<String>, document: Value) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), document);
    }

    /// Insert documents keyed by their `id` member; documents without one are skipped
    pub fn insert_all(&self, collection: &str, documents: impl IntoIterator<Item = Value>) -> usize {
        let mut inserted = 0;
        let mut collections = self.collections.write();
        let target = collections.entry(collection.to_string()).or_default();
        for document in documents {
            if let Some(id) = document.get("id").and_then(Value::as_str).map(str::to_string) {
                target.insert(id, document);
                inserted += 1;
            }
        }
        inserted
    }

    pub fn remove(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let collections = self.collections.read();
        let response = match collections.get(collection) {
            Some(docs) => eval::search(docs.iter().map(|(id, doc)| (id.as_str(), doc)), request),
            None => eval::search(std::iter::empty::<(&str, &Value)>(), request),
        };
        Ok(response)
    }

    async fn multi_get(&self, collection: &str, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| {
                docs.get(id).map(|source| RawHit {
                    id: id.clone(),
                    source: source.clone(),
                })
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
