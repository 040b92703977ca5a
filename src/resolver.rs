//! Bulk entity resolver: hydrates typed references with one fetch per type.

use crate::document::Document;
use crate::error::EngineError;
use crate::registry::TypeRegistry;
use crate::types::{DocumentId, EntityReference, TypeTag};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Default number of type groups fetched at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// A type group that could not be resolved
#[derive(Debug)]
pub struct GroupFailure {
    pub type_tag: TypeTag,
    pub ids: Vec<DocumentId>,
    pub error: EngineError,
}

/// Outcome of [`BulkEntityResolver::resolve`].
///
/// A failing group does not affect the others; its error is kept in
/// `failures`. Order of `entities` across type groups is unspecified.
#[derive(Debug, Default)]
pub struct Resolved {
    pub entities: Vec<Document>,
    pub failures: Vec<GroupFailure>,
}

impl Resolved {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Entities grouped by type tag
    pub fn by_type(&self) -> BTreeMap<&str, Vec<&Document>> {
        let mut grouped: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
        for entity in &self.entities {
            grouped.entry(entity.kind.as_str()).or_default().push(entity);
        }
        grouped
    }

    /// All entities, or the first group failure
    pub fn into_strict(self) -> Result<Vec<Document>, EngineError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.entities),
        }
    }
}

/// Collects references, deduplicated per `(type tag, id)`, and resolves them
/// with one `find_all_by_id` call per type tag
pub struct BulkEntityResolver<'a> {
    registry: &'a TypeRegistry,
    refs: BTreeMap<TypeTag, BTreeSet<DocumentId>>,
    max_concurrent: usize,
}

impl<'a> BulkEntityResolver<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            refs: BTreeMap::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn add(&mut self, reference: &EntityReference) {
        self.refs
            .entry(reference.type_tag().to_string())
            .or_default()
            .insert(reference.id().to_string());
    }

    pub fn add_all<'r>(&mut self, references: impl IntoIterator<Item = &'r EntityReference>) {
        for reference in references {
            self.add(reference);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Number of distinct `(type tag, id)` pairs
    pub fn len(&self) -> usize {
        self.refs.values().map(BTreeSet::len).sum()
    }

    /// Fetch every collected reference.
    ///
    /// An empty resolver returns immediately without contacting any repository.
    #[instrument(skip(self), fields(groups = self.refs.len(), references = self.len()))]
    pub async fn resolve(self) -> Resolved {
        if self.refs.is_empty() {
            return Resolved::default();
        }

        let registry = self.registry;
        let outcomes: Vec<(TypeTag, Vec<DocumentId>, Result<Vec<Document>, EngineError>)> =
            stream::iter(self.refs)
                .map(|(type_tag, ids)| async move {
                    let ids: Vec<DocumentId> = ids.into_iter().collect();
                    let outcome = match registry.resolve_repository(&type_tag) {
                        Ok(repository) => repository
                            .find_all_by_id(&ids)
                            .await
                            .map_err(EngineError::from),
                        Err(e) => Err(EngineError::from(e)),
                    };
                    (type_tag, ids, outcome)
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        let mut resolved = Resolved::default();
        for (type_tag, ids, outcome) in outcomes {
            match outcome {
                Ok(entities) => {
                    debug!(
                        type_tag = %type_tag,
                        requested = ids.len(),
                        found = entities.len(),
                        "Resolved type group"
                    );
                    resolved.entities.extend(entities);
                }
                Err(error) => {
                    warn!(type_tag = %type_tag, ids = ids.len(), error = %error, "Type group failed");
                    resolved.failures.push(GroupFailure {
                        type_tag,
                        ids,
                        error,
                    });
                }
            }
        }
        resolved
    }
}
