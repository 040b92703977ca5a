//! Corpus service: the use cases built on federation, resolution and the tree builder.
//!
//! - document lookup, alone or with its related objects
//! - faceted / federated search with optional hydration of referenced entities
//! - lemma attestation trees over the dating thesaurus

use crate::attestation::{AttestationTree, NestedAttestation, Period};
use crate::config::{EngineConfig, StoreBackend};
use crate::document::Document;
use crate::error::{EngineError, FederationError};
use crate::executor::QueryExecutor;
use crate::federation::{CancellationFlag, NodeId, QueryGraph, Scheduler};
use crate::query::{AggregationSpec, Page, QueryNode};
use crate::registry::TypeRegistry;
use crate::resolver::{BulkEntityResolver, GroupFailure, Resolved};
use crate::result::{ExecutedResult, SearchPage};
use crate::search::mapping::{token_lemma_clause, SENTENCE_TEXT_ID};
use crate::search::{to_graph, MappingSettings, SearchCommand};
use crate::store::{HttpStore, MemoryStore, SledStore, StoreClient};
use crate::types::{tags, EntityReference, TypeTag};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument};

/// Passport field carrying the dating thesaurus reference of a text
pub const TEXT_DATE_FIELD: &str = "passport.date.id";

/// Name of the per-period count aggregation
const DATE_AGGREGATION: &str = "date";

/// A type group that could not be hydrated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub type_tag: TypeTag,
    pub ids: Vec<String>,
    pub message: String,
}

impl From<GroupFailure> for FailureSummary {
    fn from(failure: GroupFailure) -> Self {
        Self {
            type_tag: failure.type_tag,
            ids: failure.ids,
            message: failure.error.to_string(),
        }
    }
}

/// Hydrated related objects grouped by type tag, plus the groups that failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedObjects {
    pub objects: BTreeMap<TypeTag, Vec<Document>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureSummary>,
}

impl From<Resolved> for RelatedObjects {
    fn from(resolved: Resolved) -> Self {
        let mut objects: BTreeMap<TypeTag, Vec<Document>> = BTreeMap::new();
        for entity in resolved.entities {
            objects.entry(entity.kind.clone()).or_default().push(entity);
        }
        for documents in objects.values_mut() {
            documents.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Self {
            objects,
            failures: resolved
                .failures
                .into_iter()
                .map(FailureSummary::from)
                .collect(),
        }
    }
}

impl RelatedObjects {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.failures.is_empty()
    }
}

/// A document with its related objects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentEnvelope {
    pub document: Document,
    pub related: RelatedObjects,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Resolve the references of every hit
    pub hydrate_related: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: SearchPage<Document>,
    #[serde(skip_serializing_if = "RelatedObjects::is_empty")]
    pub related: RelatedObjects,
}

/// Texts attesting a lemma, counted per dating period and nested by period hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LemmaAttestations {
    pub lemma_id: String,
    /// Texts with at least one sentence attesting the lemma
    pub text_count: u64,
    /// Text count per dating thesaurus id
    pub counts: BTreeMap<String, u64>,
    pub tree: Option<NestedAttestation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureSummary>,
}

/// Entry point for every engine use case
pub struct CorpusService {
    executor: QueryExecutor,
    registry: Arc<TypeRegistry>,
    mapping: MappingSettings,
    max_concurrent_queries: usize,
    max_concurrent_fetches: usize,
    default_page_size: usize,
}

impl CorpusService {
    pub fn new(store: Arc<dyn StoreClient>, registry: Arc<TypeRegistry>, config: &EngineConfig) -> Self {
        let mut executor = QueryExecutor::new(store, registry.clone());
        if let Some(timeout) = config.store.timeout() {
            executor = executor.with_timeout(timeout);
        }
        Self {
            executor,
            registry,
            mapping: MappingSettings::from(&config.federation),
            max_concurrent_queries: config.federation.max_concurrent_queries,
            max_concurrent_fetches: config.resolver.max_concurrent_fetches,
            default_page_size: config.federation.default_page_size,
        }
    }

    /// Open the configured store backend and register every configured collection
    pub fn open(config: &EngineConfig) -> Result<Self, EngineError> {
        let store: Arc<dyn StoreClient> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Sled => Arc::new(SledStore::new(&config.store.path)?),
            StoreBackend::Http => Arc::new(HttpStore::new(
                config.store.url.clone(),
                config.store.timeout().unwrap_or(std::time::Duration::from_secs(30)),
            )?),
        };
        let registry = Arc::new(TypeRegistry::from_collections(&config.collections, store.clone())?);
        info!(
            backend = store.backend_name(),
            types = config.collections.len(),
            "Corpus service ready"
        );
        Ok(Self::new(store, registry, config))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// First page at the configured default size
    pub fn default_page(&self) -> Page {
        Page::of(0, self.default_page_size)
    }

    fn resolver(&self) -> BulkEntityResolver<'_> {
        BulkEntityResolver::new(&self.registry).with_max_concurrent(self.max_concurrent_fetches)
    }

    fn scheduler(&self, cancel: Option<CancellationFlag>) -> Scheduler<'_, QueryExecutor> {
        let scheduler =
            Scheduler::new(&self.executor).with_max_concurrency(self.max_concurrent_queries);
        match cancel {
            Some(flag) => scheduler.with_cancellation(flag),
            None => scheduler,
        }
    }

    /// `Ok(None)` when no document has this id
    #[instrument(skip(self))]
    pub async fn get_document(&self, type_tag: &str, id: &str) -> Result<Option<Document>, EngineError> {
        let repository = self.registry.resolve_repository(type_tag)?;
        Ok(repository.find_by_id(id).await?)
    }

    /// The document plus every object it references, fetched in one call per type
    #[instrument(skip(self))]
    pub async fn get_with_related(
        &self,
        type_tag: &str,
        id: &str,
    ) -> Result<Option<DocumentEnvelope>, EngineError> {
        let Some(document) = self.get_document(type_tag, id).await? else {
            return Ok(None);
        };
        let mut resolver = self.resolver();
        resolver.add_all(&document.outgoing_references());
        let related = RelatedObjects::from(resolver.resolve().await);
        Ok(Some(DocumentEnvelope { document, related }))
    }

    /// Run a search command and page through its hits
    #[instrument(skip(self, command, cancel), fields(target = command.target()))]
    pub async fn search(
        &self,
        command: &SearchCommand,
        page: Page,
        options: SearchOptions,
        cancel: Option<CancellationFlag>,
    ) -> Result<SearchOutcome, EngineError> {
        let (graph, root) = to_graph(command, &self.mapping)?;
        let result = self.scheduler(cancel).run(graph, root, page).await?;
        let results = to_search_page(command.target(), result)?;

        let related = if options.hydrate_related {
            let mut resolver = self.resolver();
            for document in &results.items {
                resolver.add_all(&document.outgoing_references());
            }
            RelatedObjects::from(resolver.resolve().await)
        } else {
            RelatedObjects::default()
        };

        Ok(SearchOutcome { results, related })
    }

    /// Texts attesting `lemma_id`, counted per dating period and nested along
    /// the thesaurus hierarchy
    #[instrument(skip(self, cancel))]
    pub async fn lemma_attestations(
        &self,
        lemma_id: &str,
        cancel: Option<CancellationFlag>,
    ) -> Result<LemmaAttestations, EngineError> {
        let (graph, root) = self.attestation_graph(lemma_id)?;
        let result = self.scheduler(cancel).run(graph, root, Page::Unpaged).await?;
        let counts = result.bucket_map(DATE_AGGREGATION);

        let mut resolver = self.resolver();
        for id in counts.keys() {
            resolver.add(&EntityReference::new(id.clone(), tags::THS));
        }
        let mut resolved = resolver.resolve().await;

        // Second round: period ancestors named in paths, so dated entries nest under them
        let known: BTreeSet<String> = resolved.entities.iter().map(|d| d.id.clone()).collect();
        let mut ancestors = self.resolver();
        for document in &resolved.entities {
            for path in &document.paths {
                for segment in path.segments() {
                    if segment.type_tag() == tags::THS && !known.contains(segment.id()) {
                        ancestors.add(segment);
                    }
                }
            }
        }
        if !ancestors.is_empty() {
            let more = ancestors.resolve().await;
            resolved.entities.extend(more.entities);
            resolved.failures.extend(more.failures);
        }

        let tree = AttestationTree::new(&resolved.entities).resolve(&counts, Period::of);

        Ok(LemmaAttestations {
            lemma_id: lemma_id.to_string(),
            text_count: result.total_hits(),
            counts,
            tree,
            failures: resolved
                .failures
                .into_iter()
                .map(FailureSummary::from)
                .collect(),
        })
    }

    fn attestation_graph(
        &self,
        lemma_id: &str,
    ) -> Result<(QueryGraph, NodeId), FederationError> {
        let mut graph = QueryGraph::new();

        let mut texts = QueryNode::new(tags::TEXT).labeled("dated texts");
        texts.aggregate(
            AggregationSpec::terms(DATE_AGGREGATION, TEXT_DATE_FIELD)
                .size(self.mapping.id_aggregation_size),
        );
        let root = graph.add(texts);

        let mut sentences = QueryNode::new(tags::SENTENCE).labeled("attesting sentences");
        sentences
            .must(token_lemma_clause(lemma_id))
            .aggregate(AggregationSpec::ids(
                SENTENCE_TEXT_ID,
                self.mapping.id_aggregation_size,
            ));
        let producer = graph.add(sentences);
        graph.restrict_ids_to_producer(root, producer)?;
        Ok((graph, root))
    }
}

fn to_search_page(target: &str, result: ExecutedResult) -> Result<SearchPage<Document>, EngineError> {
    let page = result.page_info();
    let facets = result.facets();
    let items = result
        .into_hits()
        .into_iter()
        .map(|hit| Document::from_source(target, Some(hit.id.as_str()), hit.source))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SearchPage { page, items, facets })
}
