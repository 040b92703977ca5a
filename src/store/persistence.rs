//! Sled-backed embedded document store

use super::eval;
use super::{SearchRequest, SearchResponse, StoreClient};
use crate::error::StoreError;
use crate::result::RawHit;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Sled-based implementation of StoreClient
///
/// Each collection is a sled tree keyed by document id; values are JSON.
/// Searches scan the collection and evaluate filters locally.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| sled_error("open sled database", e))?;
        Ok(Self { db })
    }

    /// Wrap an already opened database
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Insert or replace a document
    pub fn insert(&self, collection: &str, id: &str, document: &Value) -> Result<(), StoreError> {
        let tree = self.tree(collection)?;
        let value = serde_json::to_vec(document).map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize document {}: {}", id, e),
            ))
        })?;
        tree.insert(id.as_bytes(), value)
            .map_err(|e| sled_error("insert document", e))?;
        Ok(())
    }

    pub fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let tree = self.tree(collection)?;
        let removed = tree
            .remove(id.as_bytes())
            .map_err(|e| sled_error("remove document", e))?;
        Ok(removed.is_some())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| sled_error("flush sled database", e))?;
        Ok(())
    }

    fn tree(&self, collection: &str) -> Result<sled::Tree, StoreError> {
        self.db
            .open_tree(collection)
            .map_err(|e| sled_error("open collection tree", e))
    }

    /// The collection's tree, without creating it when absent
    fn existing_tree(&self, collection: &str) -> Result<Option<sled::Tree>, StoreError> {
        let exists = self
            .db
            .tree_names()
            .iter()
            .any(|name| name.as_ref() == collection.as_bytes());
        if exists {
            self.tree(collection).map(Some)
        } else {
            Ok(None)
        }
    }

    fn load_collection(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let Some(tree) = self.existing_tree(collection)? else {
            return Ok(Vec::new());
        };
        let mut documents = Vec::with_capacity(tree.len());
        for entry in tree.iter() {
            let (key, value) = entry.map_err(|e| sled_error("scan collection", e))?;
            let id = String::from_utf8_lossy(&key).to_string();
            documents.push((id.clone(), decode(&id, &value)?));
        }
        debug!(collection, documents = documents.len(), "Loaded collection");
        Ok(documents)
    }
}

fn decode(id: &str, bytes: &[u8]) -> Result<Value, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Decode(format!("document {}: {}", id, e)))
}

fn sled_error(action: &str, err: sled::Error) -> StoreError {
    StoreError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to {}: {}", action, err),
    ))
}

#[async_trait]
impl StoreClient for SledStore {
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let documents = self.load_collection(collection)?;
        Ok(eval::search(
            documents.iter().map(|(id, doc)| (id.as_str(), doc)),
            request,
        ))
    }

    async fn multi_get(&self, collection: &str, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        let Some(tree) = self.existing_tree(collection)? else {
            return Ok(Vec::new());
        };
        let mut hits = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = tree
                .get(id.as_bytes())
                .map_err(|e| sled_error("get document", e))?
            {
                hits.push(RawHit {
                    id: id.clone(),
                    source: decode(id, &value)?,
                });
            }
        }
        Ok(hits)
    }

    fn backend_name(&self) -> &str {
        "sled"
    }
}
