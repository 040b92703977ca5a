//! Faceted search: paging math, sorting, facets and hydration

use super::test_utils::corpus_service;
use scriptorium::error::{EngineError, FederationError};
use scriptorium::query::Page;
use scriptorium::search::{
    LemmaSearch, PassportFilter, SearchCommand, SentenceSearch, TextSearch, TranslationSpec,
};
use scriptorium::service::SearchOptions;

fn lemma_search(search: LemmaSearch) -> SearchCommand {
    SearchCommand::Lemma(search)
}

#[tokio::test]
async fn test_no_hits_reports_one_page_and_skips_hydration() {
    let (service, store) = corpus_service();
    let command = lemma_search(LemmaSearch {
        doc_type: Some("verb".to_string()),
        ..LemmaSearch::default()
    });
    let outcome = service
        .search(
            &command,
            Page::of(0, 20),
            SearchOptions {
                hydrate_related: true,
            },
            None,
        )
        .await
        .unwrap();

    assert!(outcome.results.items.is_empty());
    assert_eq!(outcome.results.page.total_elements, 0);
    assert_eq!(outcome.results.page.total_pages, 1);
    assert!(outcome.related.is_empty());
    assert_eq!(store.searches().len(), 1);
    assert!(store.multi_gets().is_empty(), "nothing to resolve");
}

#[tokio::test]
async fn test_last_page_is_partial() {
    let (service, _store) = corpus_service();
    let command = SearchCommand::Sentence(SentenceSearch {
        lemma: Some("L1".to_string()),
        ..SentenceSearch::default()
    });

    let first = service
        .search(&command, Page::of(0, 3), SearchOptions::default(), None)
        .await
        .unwrap();
    assert_eq!(first.results.page.total_elements, 7);
    assert_eq!(first.results.page.total_pages, 3);
    assert_eq!(first.results.items.len(), 3);
    assert_eq!(first.results.facets["lemma"]["L1"], 7);

    let last = service
        .search(&command, Page::of(2, 3), SearchOptions::default(), None)
        .await
        .unwrap();
    assert_eq!(last.results.page.number, 2);
    assert_eq!(last.results.items.len(), 1);
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let (service, store) = corpus_service();
    let err = service
        .search(
            &lemma_search(LemmaSearch::default()),
            Page::of(0, 0),
            SearchOptions::default(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Federation(FederationError::InvalidPage(_))
    ));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_sort_and_type_facets() {
    let (service, _store) = corpus_service();
    let command = lemma_search(LemmaSearch {
        sort: Some("sortKey_asc".to_string()),
        ..LemmaSearch::default()
    });
    let outcome = service
        .search(&command, Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.results.items.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["L2", "L1", "L3"]);
    assert_eq!(outcome.results.facets["type"]["substantive"], 2);
    assert_eq!(outcome.results.facets["type"]["root"], 1);
    assert_eq!(outcome.results.facets["subtype"]["substantive_masc"], 1);
}

#[tokio::test]
async fn test_translation_search_in_one_language() {
    let (service, _store) = corpus_service();
    let command = lemma_search(LemmaSearch {
        translation: Some(TranslationSpec {
            text: "Haus".to_string(),
            languages: vec!["de".to_string()],
        }),
        ..LemmaSearch::default()
    });
    let outcome = service
        .search(&command, Page::of(0, 20), SearchOptions::default(), None)
        .await
        .unwrap();
    let ids: Vec<&str> = outcome.results.items.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["L2"]);
}

#[tokio::test]
async fn test_passport_filter_and_hydration_one_fetch_per_type() {
    let (service, store) = corpus_service();
    let command = SearchCommand::Text(TextSearch {
        passport: vec![PassportFilter::new("date.id", ["D2", "D3"])],
        ..TextSearch::default()
    });
    let outcome = service
        .search(
            &command,
            Page::of(0, 20),
            SearchOptions {
                hydrate_related: true,
            },
            None,
        )
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.results.items.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2"]);

    let ths: Vec<&str> = outcome.related.objects["ths"]
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(ths, vec!["D2", "D3"]);

    let fetched = store.multi_gets();
    assert_eq!(fetched.len(), 1, "both dates in a single fetch");
    assert_eq!(fetched[0].0, "ths_entries");
    assert_eq!(fetched[0].1, vec!["D2", "D3"]);
}
