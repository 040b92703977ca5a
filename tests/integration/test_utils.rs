//! Shared test utilities for integration tests
//!
//! A small Egyptian-corpus fixture held in memory, and a store wrapper that
//! records every call so tests can assert on what reached the backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use scriptorium::config::{EngineConfig, StoreBackend};
use scriptorium::error::StoreError;
use scriptorium::query::Expr;
use scriptorium::registry::TypeRegistry;
use scriptorium::result::RawHit;
use scriptorium::service::CorpusService;
use scriptorium::store::{MemoryStore, SearchRequest, SearchResponse, StoreClient};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One call that reached the backend
#[derive(Debug, Clone)]
pub enum StoreCall {
    Search {
        collection: String,
        request: SearchRequest,
    },
    MultiGet {
        collection: String,
        ids: Vec<String>,
    },
}

/// Memory store that records calls and can be told to fail whole collections
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    failing: Mutex<BTreeSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_collection(&self, collection: &str) {
        self.failing.lock().insert(collection.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn searches(&self) -> Vec<(String, SearchRequest)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Search {
                    collection,
                    request,
                } => Some((collection, request)),
                _ => None,
            })
            .collect()
    }

    pub fn multi_gets(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::MultiGet { collection, ids } => Some((collection, ids)),
                _ => None,
            })
            .collect()
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing.lock().contains(collection) {
            return Err(StoreError::Rejected {
                status: 503,
                message: format!("{} unavailable", collection),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for RecordingStore {
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        self.calls.lock().push(StoreCall::Search {
            collection: collection.to_string(),
            request: request.clone(),
        });
        self.check(collection)?;
        self.inner.search(collection, request).await
    }

    async fn multi_get(&self, collection: &str, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        self.calls.lock().push(StoreCall::MultiGet {
            collection: collection.to_string(),
            ids: ids.to_vec(),
        });
        self.check(collection)?;
        self.inner.multi_get(collection, ids).await
    }

    fn backend_name(&self) -> &str {
        "recording"
    }
}

pub fn memory_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.store.backend = StoreBackend::Memory;
    config
}

/// Service over `store` with the default collection table
pub fn service_over(store: Arc<RecordingStore>, config: &EngineConfig) -> CorpusService {
    let registry = Arc::new(
        TypeRegistry::from_collections(&config.collections, store.clone())
            .expect("default collections are unique"),
    );
    CorpusService::new(store, registry, config)
}

fn sentence(id: &str, text_id: &str, lemmas: &[&str]) -> Value {
    let tokens: Vec<Value> = lemmas
        .iter()
        .enumerate()
        .map(|(i, lemma)| json!({"id": format!("{}-t{}", id, i), "lemma": {"id": lemma}}))
        .collect();
    json!({
        "id": id,
        "context": {"textId": text_id, "textType": "Text"},
        "tokens": tokens,
    })
}

/// Fixture corpus:
/// - lemma L1 occurs in five sentences of T1 and two of T2
/// - lemma L2 occurs once, in T3
/// - dating thesaurus: D1 (Middle Kingdom) > D2 (Dyn. 12), D3 (Dyn. 13); D9 stands alone
pub fn load_corpus(store: &MemoryStore) {
    store.insert_all(
        "lemma_entries",
        vec![
            json!({"id": "L1", "name": "nfr", "type": "root", "sortKey": "b",
                   "translations": {"en": ["good", "beautiful"], "de": ["gut"]},
                   "relations": {"root": [{"id": "L3", "type": "lemma", "name": "nfr.w"}]}}),
            json!({"id": "L2", "name": "pr", "type": "substantive", "subtype": "substantive_masc", "sortKey": "a",
                   "translations": {"en": ["house"], "de": ["Haus"]}}),
            json!({"id": "L3", "name": "nfr.w", "type": "substantive", "sortKey": "c",
                   "relations": {"partOf": [{"id": "L404", "type": "lemma"}]}}),
        ],
    );

    store.insert_all(
        "text_entries",
        vec![
            json!({"id": "T1", "name": "Sinuhe B", "type": "Text", "sortKey": "2",
                   "passport": {"date": {"id": "D2", "type": "ths", "name": "Dyn. 12"}},
                   "paths": [[{"id": "C1", "type": "corpus"}]]}),
            json!({"id": "T2", "name": "Shipwrecked Sailor", "type": "Text", "sortKey": "1",
                   "passport": {"date": {"id": "D3", "type": "ths", "name": "Dyn. 13"}}}),
            json!({"id": "T3", "name": "Tale of the Eloquent Peasant", "type": "Text", "sortKey": "3",
                   "passport": {"date": {"id": "D9", "type": "ths", "name": "Second Intermediate Period"}}}),
        ],
    );

    let mut sentences = Vec::new();
    for i in 0..5 {
        sentences.push(sentence(&format!("S1-{}", i), "T1", &["L1"]));
    }
    sentences.push(sentence("S2-0", "T2", &["L1", "L2"]));
    sentences.push(sentence("S2-1", "T2", &["L1"]));
    sentences.push(sentence("S3-0", "T3", &["L2"]));
    store.insert_all("sentence_entries", sentences);

    store.insert_all(
        "ths_entries",
        vec![
            json!({"id": "D1", "name": "Middle Kingdom",
                   "passport": {"timespan": {"begin": "-2055", "end": "-1650"}}}),
            json!({"id": "D2", "name": "Dyn. 12",
                   "passport": {"timespan": {"begin": -1976, "end": -1794}},
                   "paths": [[{"id": "D1", "type": "ths"}]]}),
            json!({"id": "D3", "name": "Dyn. 13",
                   "passport": {"timespan": {"begin": -1794, "end": -1650}},
                   "paths": [[{"id": "D1", "type": "ths"}]]}),
            json!({"id": "D9", "name": "Second Intermediate Period",
                   "passport": {"timespan": {"begin": [-1650], "end": -1550}}}),
        ],
    );

    store.insert_all("corpus_entries", vec![json!({"id": "C1", "name": "Middle Egyptian Literature"})]);
}

/// Service over a recording store loaded with [`load_corpus`]
pub fn corpus_service() -> (CorpusService, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new());
    load_corpus(store.memory());
    let service = service_over(store.clone(), &memory_config());
    (service, store)
}

/// Ids of the first id filter anywhere in `expr`
pub fn find_id_filter(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ids(ids) => Some(ids.clone()),
        Expr::Bool(b) => b
            .must
            .iter()
            .chain(&b.filter)
            .chain(&b.should)
            .find_map(find_id_filter),
        Expr::Nested { query, .. } => find_id_filter(query),
        _ => None,
    }
}

/// Values of the first terms filter on `field` anywhere in `expr`
pub fn find_terms_filter(expr: &Expr, field: &str) -> Option<Vec<Value>> {
    match expr {
        Expr::Terms { field: f, values } if f == field => Some(values.clone()),
        Expr::Bool(b) => b
            .must
            .iter()
            .chain(&b.filter)
            .chain(&b.should)
            .find_map(|e| find_terms_filter(e, field)),
        _ => None,
    }
}
