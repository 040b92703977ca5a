//! Lemma attestations folded into the dating thesaurus hierarchy

use super::test_utils::corpus_service;
use scriptorium::attestation::{AttestationTree, Period};
use scriptorium::document::Document;
use serde_json::json;
use std::collections::BTreeMap;

fn ths(id: &str, paths: serde_json::Value) -> Document {
    Document::from_source("ths", None, json!({"id": id, "name": id, "paths": paths})).unwrap()
}

#[tokio::test]
async fn test_attestations_nest_under_shared_ancestor() {
    let (service, store) = corpus_service();
    let attestations = service.lemma_attestations("L1", None).await.unwrap();

    assert_eq!(attestations.text_count, 2);
    let expected: BTreeMap<String, u64> =
        [("D2".to_string(), 1), ("D3".to_string(), 1)].into_iter().collect();
    assert_eq!(attestations.counts, expected);

    let tree = attestations.tree.expect("dated attestations");
    let root = tree.period.as_ref().unwrap();
    assert_eq!(root.reference.id(), "D1");
    assert_eq!(root.begin, Some(-2055));
    assert_eq!(tree.total, 2);
    let children: Vec<&str> = tree
        .children
        .iter()
        .map(|c| c.period.as_ref().unwrap().reference.id())
        .collect();
    assert_eq!(children, vec!["D2", "D3"]);

    // counted dates first, then their missing ancestor
    let fetched: Vec<Vec<String>> = store.multi_gets().into_iter().map(|(_, ids)| ids).collect();
    assert_eq!(fetched, vec![vec!["D2", "D3"], vec!["D1"]]);
}

#[tokio::test]
async fn test_separate_roots_get_synthetic_wrapper() {
    let (service, _store) = corpus_service();
    let attestations = service.lemma_attestations("L2", None).await.unwrap();

    let tree = attestations.tree.unwrap();
    assert!(tree.is_synthetic());
    assert_eq!(tree.total, 2);
    let roots: Vec<&str> = tree
        .children
        .iter()
        .map(|c| c.period.as_ref().unwrap().reference.id())
        .collect();
    // ordered by period begin: Middle Kingdom (-2055) before D9 (-1650)
    assert_eq!(roots, vec!["D1", "D9"]);
    assert_eq!(tree.find("D3").unwrap().count, 1);
}

#[tokio::test]
async fn test_unattested_lemma_has_no_tree() {
    let (service, store) = corpus_service();
    let attestations = service.lemma_attestations("L404", None).await.unwrap();
    assert_eq!(attestations.text_count, 0);
    assert!(attestations.counts.is_empty());
    assert!(attestations.tree.is_none());
    assert!(store.multi_gets().is_empty());
}

#[test]
fn test_entry_attaches_to_nearest_indexed_ancestor_only() {
    let entities = vec![
        ths("root", json!([])),
        ths("mid", json!([[{"id": "root", "type": "ths"}]])),
        ths(
            "leaf",
            json!([[{"id": "root", "type": "ths"}, {"id": "mid", "type": "ths"}]]),
        ),
    ];
    let tree = AttestationTree::new(&entities);

    let ids = |docs: Vec<&Document>| docs.into_iter().map(|d| d.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(tree.roots()), vec!["root"]);
    assert_eq!(ids(tree.children_of("root")), vec!["mid"]);
    assert_eq!(ids(tree.children_of("mid")), vec!["leaf"]);
    assert_eq!(ids(tree.parents_of("leaf")), vec!["mid"]);

    let counts: BTreeMap<String, u64> =
        [("leaf".to_string(), 4), ("root".to_string(), 1)].into_iter().collect();
    let nested = tree.resolve(&counts, Period::of).unwrap();
    assert_eq!(nested.total, 5);
    assert_eq!(nested.find("mid").unwrap().total, 4);
}
