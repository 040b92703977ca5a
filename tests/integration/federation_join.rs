//! Cross-collection joins through producer id sets

use super::test_utils::{corpus_service, find_id_filter, find_terms_filter, load_corpus, memory_config};
use scriptorium::error::{EngineError, FederationError};
use scriptorium::executor::{QueryExecutor, QueryRunner};
use scriptorium::federation::{CancellationFlag, QueryGraph, Scheduler};
use scriptorium::query::{AggregationSpec, Page, QueryNode, ID_AGGREGATION};
use scriptorium::registry::TypeRegistry;
use scriptorium::search::mapping::token_lemma_clause;
use scriptorium::search::{SearchCommand, SentenceSearch, TextSearch};
use scriptorium::service::SearchOptions;
use scriptorium::store::MemoryStore;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn texts_containing(lemma: &str) -> SearchCommand {
    SearchCommand::Text(TextSearch {
        containing_lemma: Some(lemma.to_string()),
        ..TextSearch::default()
    })
}

#[tokio::test]
async fn test_id_aggregation_counts_sentences_per_text() {
    let store = Arc::new(MemoryStore::new());
    load_corpus(&store);
    let config = memory_config();
    let registry = Arc::new(TypeRegistry::from_collections(&config.collections, store.clone()).unwrap());
    let executor = QueryExecutor::new(store, registry);

    let mut node = QueryNode::new("sentence");
    node.must(token_lemma_clause("L1"))
        .aggregate(AggregationSpec::ids("context.textId", 100));
    let snapshot = node.build(Page::Unpaged).unwrap();
    let result = executor.execute(&snapshot, None).await.unwrap();

    let expected: BTreeMap<String, u64> =
        [("T1".to_string(), 5), ("T2".to_string(), 2)].into_iter().collect();
    assert_eq!(result.bucket_map(ID_AGGREGATION), expected);
    assert_eq!(result.id_bucket_keys(), vec!["T1", "T2"]);
}

#[tokio::test]
async fn test_text_join_filters_consumer_by_producer_ids() {
    let (service, store) = corpus_service();
    let outcome = service
        .search(&texts_containing("L1"), Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.results.items.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2"]);

    let searches = store.searches();
    assert_eq!(searches.len(), 2, "one producer, one consumer");
    assert_eq!(searches[0].0, "sentence_entries");
    assert_eq!(searches[0].1.aggregations[0].name, ID_AGGREGATION);
    assert_eq!(searches[1].0, "text_entries");
    assert_eq!(
        find_id_filter(&searches[1].1.query),
        Some(vec!["T1".to_string(), "T2".to_string()])
    );
}

#[tokio::test]
async fn test_empty_producer_still_filters_consumer() {
    let (service, store) = corpus_service();
    let outcome = service
        .search(&texts_containing("L999"), Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap();

    assert!(outcome.results.items.is_empty());
    assert_eq!(outcome.results.page.total_elements, 0);
    assert_eq!(outcome.results.page.total_pages, 1);
    let searches = store.searches();
    assert_eq!(find_id_filter(&searches[1].1.query), Some(vec![]));
}

#[tokio::test]
async fn test_transitive_join_runs_producers_first() {
    let (service, store) = corpus_service();
    let command = SearchCommand::Sentence(SentenceSearch {
        lemma: Some("L1".to_string()),
        text: Some(TextSearch {
            containing_lemma: Some("L2".to_string()),
            ..TextSearch::default()
        }),
        sort: None,
    });
    let outcome = service
        .search(&command, Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap();

    let collections: Vec<String> = store.searches().into_iter().map(|(c, _)| c).collect();
    assert_eq!(
        collections,
        vec!["sentence_entries", "text_entries", "sentence_entries"]
    );

    // L2 occurs in T2 and T3; only T2 also has L1 sentences
    let root_request = &store.searches()[2].1;
    assert_eq!(
        find_terms_filter(&root_request.query, "context.textId"),
        Some(vec![json!("T2"), json!("T3")])
    );
    let ids: Vec<&str> = outcome.results.items.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["S2-0", "S2-1"]);
}

#[tokio::test]
async fn test_producer_failure_aborts_before_consumer() {
    let (service, store) = corpus_service();
    store.fail_collection("sentence_entries");

    let err = service
        .search(&texts_containing("L1"), Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap_err();
    match err {
        EngineError::Federation(FederationError::Store { node, .. }) => {
            assert_eq!(node, "sentence (join)")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(store
        .searches()
        .iter()
        .all(|(collection, _)| collection != "text_entries"));
}

#[tokio::test]
async fn test_cancelled_search_reaches_no_store() {
    let (service, store) = corpus_service();
    let flag = CancellationFlag::new();
    flag.cancel();

    let err = service
        .search(
            &texts_containing("L1"),
            Page::of(0, 20),
            SearchOptions::default(),
            Some(flag),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Federation(FederationError::Cancelled)
    ));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_cycle_is_rejected_before_execution() {
    let store = Arc::new(MemoryStore::new());
    let config = memory_config();
    let registry = Arc::new(TypeRegistry::from_collections(&config.collections, store.clone()).unwrap());
    let executor = QueryExecutor::new(store, registry);

    let mut graph = QueryGraph::new();
    let a = graph.add(QueryNode::new("text").labeled("a"));
    let b = graph.add(QueryNode::new("sentence").labeled("b"));
    graph.restrict_ids_to_producer(a, b).unwrap();
    graph.filter_by_producer_ids(b, a, "context.textId").unwrap();

    let err = Scheduler::new(&executor)
        .run(graph, a, Page::of(0, 10))
        .await
        .unwrap_err();
    match err {
        FederationError::Cycle { path } => assert_eq!(path, vec!["a", "b", "a"]),
        other => panic!("unexpected error {:?}", other),
    }
}
