//! Type registry: explicit type tag → collection / repository table.
//!
//! Built once at startup through [`TypeRegistryBuilder::register`] and shared
//! read-only (`Arc<TypeRegistry>`) by every component that resolves type tags.

use crate::document::Document;
use crate::error::{RegistryError, StoreError};
use crate::store::StoreClient;
use crate::types::TypeTag;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Lookup of documents of one entity type
#[async_trait]
pub trait Repository: Send + Sync {
    fn type_tag(&self) -> &str;

    /// `Ok(None)` when no document has this id
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Every existing document among `ids`; missing ids are absent from the result
    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<Document>, StoreError>;
}

/// Repository reading one collection through a [`StoreClient`]
pub struct StoreRepository {
    type_tag: TypeTag,
    collection: String,
    store: Arc<dyn StoreClient>,
}

impl StoreRepository {
    pub fn new(
        type_tag: impl Into<TypeTag>,
        collection: impl Into<String>,
        store: Arc<dyn StoreClient>,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            collection: collection.into(),
            store,
        }
    }

    fn parse(&self, id: &str, source: serde_json::Value) -> Result<Document, StoreError> {
        Document::from_source(&self.type_tag, Some(id), source).map_err(|e| {
            StoreError::Decode(format!(
                "{} document {} in '{}': {}",
                self.type_tag, id, self.collection, e
            ))
        })
    }
}

#[async_trait]
impl Repository for StoreRepository {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let hits = self
            .store
            .multi_get(&self.collection, &[id.to_string()])
            .await?;
        match hits.into_iter().next() {
            Some(hit) => Ok(Some(self.parse(&hit.id, hit.source)?)),
            None => Ok(None),
        }
    }

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        let hits = self.store.multi_get(&self.collection, ids).await?;
        debug!(
            type_tag = %self.type_tag,
            requested = ids.len(),
            found = hits.len(),
            "Fetched documents"
        );
        hits.into_iter()
            .map(|hit| self.parse(&hit.id, hit.source))
            .collect()
    }
}

struct Registration {
    collection: String,
    repository: Arc<dyn Repository>,
}

/// Collects registrations; a tag may be registered once
#[derive(Default)]
pub struct TypeRegistryBuilder {
    entries: BTreeMap<TypeTag, Registration>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the collection and repository serving `type_tag`
    pub fn register(
        &mut self,
        type_tag: impl Into<TypeTag>,
        collection: impl Into<String>,
        repository: Arc<dyn Repository>,
    ) -> Result<&mut Self, RegistryError> {
        let type_tag = type_tag.into();
        if self.entries.contains_key(&type_tag) {
            return Err(RegistryError::DuplicateType(type_tag));
        }
        self.entries.insert(
            type_tag,
            Registration {
                collection: collection.into(),
                repository,
            },
        );
        Ok(self)
    }

    /// Register a [`StoreRepository`] over `collection`
    pub fn register_collection(
        &mut self,
        type_tag: impl Into<TypeTag>,
        collection: impl Into<String>,
        store: Arc<dyn StoreClient>,
    ) -> Result<&mut Self, RegistryError> {
        let type_tag = type_tag.into();
        let collection = collection.into();
        let repository = Arc::new(StoreRepository::new(
            type_tag.clone(),
            collection.clone(),
            store,
        ));
        self.register(type_tag, collection, repository)
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable type tag → collection / repository table
pub struct TypeRegistry {
    entries: BTreeMap<TypeTag, Registration>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Registry with a store-backed repository for every `tag → collection` pair
    pub fn from_collections<'a>(
        collections: impl IntoIterator<Item = (&'a String, &'a String)>,
        store: Arc<dyn StoreClient>,
    ) -> Result<Self, RegistryError> {
        let mut builder = TypeRegistryBuilder::new();
        for (type_tag, collection) in collections {
            builder.register_collection(type_tag.clone(), collection.clone(), store.clone())?;
        }
        Ok(builder.build())
    }

    pub fn resolve_collection(&self, type_tag: &str) -> Result<&str, RegistryError> {
        self.entries
            .get(type_tag)
            .map(|r| r.collection.as_str())
            .ok_or_else(|| RegistryError::UnregisteredType(type_tag.to_string()))
    }

    pub fn resolve_repository(&self, type_tag: &str) -> Result<Arc<dyn Repository>, RegistryError> {
        self.entries
            .get(type_tag)
            .map(|r| r.repository.clone())
            .ok_or_else(|| RegistryError::UnregisteredType(type_tag.to_string()))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.entries.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
