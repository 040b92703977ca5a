//! Single-document lookup with bulk hydration of its references

use super::test_utils::corpus_service;
use scriptorium::error::{EngineError, RegistryError};
use scriptorium::types::EntityReference;

#[tokio::test]
async fn test_related_lemma_fetched_in_one_call() {
    let (service, store) = corpus_service();
    let envelope = service.get_with_related("lemma", "L1").await.unwrap().unwrap();

    assert_eq!(envelope.document.id, "L1");
    assert_eq!(envelope.document.kind, "lemma");
    assert_eq!(envelope.related.objects["lemma"][0].id, "L3");
    assert_eq!(
        store.multi_gets(),
        vec![
            ("lemma_entries".to_string(), vec!["L1".to_string()]),
            ("lemma_entries".to_string(), vec!["L3".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_missing_reference_is_silently_absent() {
    let (service, _store) = corpus_service();
    let envelope = service.get_with_related("lemma", "L3").await.unwrap().unwrap();
    assert!(envelope.related.objects.is_empty());
    assert!(envelope.related.failures.is_empty());
}

#[tokio::test]
async fn test_failing_type_group_does_not_hide_the_others() {
    let (service, store) = corpus_service();
    store.fail_collection("ths_entries");

    let envelope = service.get_with_related("text", "T1").await.unwrap().unwrap();
    assert!(envelope.related.objects.get("ths").is_none());
    assert_eq!(envelope.related.failures.len(), 1);
    let failure = &envelope.related.failures[0];
    assert_eq!(failure.type_tag, "ths");
    assert_eq!(failure.ids, vec!["D2"]);
    assert!(failure.message.contains("503"));
}

#[tokio::test]
async fn test_unregistered_type_tag_is_an_error() {
    let (service, store) = corpus_service();
    let err = service.get_document("papyrus", "P1").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::UnregisteredType(ref tag)) if tag == "papyrus"
    ));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_reference_identity_ignores_display_name() {
    let (service, store) = corpus_service();
    let text = service.get_document("text", "T2").await.unwrap().unwrap();
    let reference = &text.outgoing_references()[0];
    assert_eq!(reference, &EntityReference::new("D3", "ths"));
    assert_eq!(reference.name(), Some("Dyn. 13"));
    assert_eq!(store.multi_gets().len(), 1);
}
