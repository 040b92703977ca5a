//! Deterministic mapping of search commands into query graphs.
//!
//! Joins become producer nodes that publish ids through the id-handoff
//! aggregation; the consumer filters on them once the producer has run.

use super::command::{LemmaSearch, PassportFilter, SearchCommand, SentenceSearch, TextSearch};
use crate::config::FederationConfig;
use crate::error::FederationError;
use crate::federation::{NodeId, QueryGraph};
use crate::query::{normalize_text, AggregationSpec, Expr, QueryNode, SortSpec};
use crate::types::tags;

/// Languages searched when a translation spec names none
pub const DEFAULT_TRANSLATION_LANGUAGES: [&str; 3] = ["de", "en", "fr"];

/// Sentence field holding the id of the containing text
pub const SENTENCE_TEXT_ID: &str = "context.textId";
pub const SENTENCE_TEXT_TYPE: &str = "context.textType";
pub const TOKENS_PATH: &str = "tokens";
pub const TOKEN_LEMMA_ID: &str = "tokens.lemma.id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSettings {
    pub id_aggregation_size: usize,
    pub facet_size: usize,
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self::from(&FederationConfig::default())
    }
}

impl From<&FederationConfig> for MappingSettings {
    fn from(config: &FederationConfig) -> Self {
        Self {
            id_aggregation_size: config.id_aggregation_size,
            facet_size: config.facet_size,
        }
    }
}

/// Whether a node is the one whose hits are returned or a join input
#[derive(Debug, Clone, Copy)]
enum Role {
    Root,
    /// Publishes the values of `id_field` for a consumer
    Producer { id_field: &'static str },
}

/// Build the query graph for `command`; returns the graph and its root node
pub fn to_graph(
    command: &SearchCommand,
    settings: &MappingSettings,
) -> Result<(QueryGraph, NodeId), FederationError> {
    let mut graph = QueryGraph::new();
    let root = match command {
        SearchCommand::Lemma(search) => add_lemma(&mut graph, search, settings),
        SearchCommand::Text(search) => add_text(&mut graph, search, settings, Role::Root)?,
        SearchCommand::Sentence(search) => add_sentence(&mut graph, search, settings)?,
    };
    Ok((graph, root))
}

fn add_lemma(graph: &mut QueryGraph, search: &LemmaSearch, settings: &MappingSettings) -> NodeId {
    let mut node = QueryNode::new(tags::LEMMA);
    if let Some(name) = non_blank(search.name.as_deref()) {
        node.must(name_clause(&name));
    }
    if let Some(translation) = &search.translation {
        if let Some(text) = non_blank(Some(translation.text.as_str())) {
            let languages: Vec<&str> = if translation.languages.is_empty() {
                DEFAULT_TRANSLATION_LANGUAGES.to_vec()
            } else {
                translation.languages.iter().map(String::as_str).collect()
            };
            node.must(Expr::any_of(
                languages
                    .into_iter()
                    .map(|lang| Expr::match_all_words(format!("translations.{}", lang), &text))
                    .collect(),
            ));
        }
    }
    apply_type_filters(&mut node, search.doc_type.as_deref(), search.subtype.as_deref());
    apply_passport_filters(&mut node, &search.passport);
    apply_sort(&mut node, search.sort.as_deref());
    node.aggregate(AggregationSpec::terms("type", "type").size(settings.facet_size))
        .aggregate(AggregationSpec::terms("subtype", "subtype").size(settings.facet_size));
    graph.add(node)
}

fn add_text(
    graph: &mut QueryGraph,
    search: &TextSearch,
    settings: &MappingSettings,
    role: Role,
) -> Result<NodeId, FederationError> {
    let mut node = QueryNode::new(tags::TEXT);
    if let Some(name) = non_blank(search.name.as_deref()) {
        node.must(name_clause(&name));
    }
    apply_type_filters(&mut node, search.doc_type.as_deref(), search.subtype.as_deref());
    apply_passport_filters(&mut node, &search.passport);

    let node = match role {
        Role::Root => {
            apply_sort(&mut node, search.sort.as_deref());
            node.aggregate(AggregationSpec::terms("type", "type").size(settings.facet_size));
            node
        }
        Role::Producer { id_field } => {
            node.aggregate(AggregationSpec::ids(id_field, settings.id_aggregation_size));
            node.labeled("text (join)")
        }
    };
    let text = graph.add(node);

    if let Some(lemma) = non_blank(search.containing_lemma.as_deref()) {
        let sentences = add_sentences_with_lemma(graph, &lemma, settings);
        graph.restrict_ids_to_producer(text, sentences)?;
    }
    Ok(text)
}

fn add_sentence(
    graph: &mut QueryGraph,
    search: &SentenceSearch,
    settings: &MappingSettings,
) -> Result<NodeId, FederationError> {
    let mut node = QueryNode::new(tags::SENTENCE);
    if let Some(lemma) = non_blank(search.lemma.as_deref()) {
        node.must(token_lemma_clause(&lemma));
    }
    apply_sort(&mut node, search.sort.as_deref());
    node.aggregate(AggregationSpec::terms("textType", SENTENCE_TEXT_TYPE).size(settings.facet_size))
        .aggregate(
            AggregationSpec::terms("lemma", TOKEN_LEMMA_ID)
                .size(settings.facet_size)
                .nested(TOKENS_PATH),
        );
    let sentence = graph.add(node);

    if let Some(text_search) = &search.text {
        let texts = add_text(graph, text_search, settings, Role::Producer { id_field: "id" })?;
        graph.filter_by_producer_ids(sentence, texts, SENTENCE_TEXT_ID)?;
    }
    Ok(sentence)
}

/// Producer of the ids of texts with a sentence attesting `lemma`
fn add_sentences_with_lemma(graph: &mut QueryGraph, lemma: &str, settings: &MappingSettings) -> NodeId {
    let mut node = QueryNode::new(tags::SENTENCE).labeled("sentence (join)");
    node.must(token_lemma_clause(lemma))
        .aggregate(AggregationSpec::ids(SENTENCE_TEXT_ID, settings.id_aggregation_size));
    graph.add(node)
}

pub fn token_lemma_clause(lemma: &str) -> Expr {
    Expr::nested(TOKENS_PATH, Expr::term(TOKEN_LEMMA_ID, lemma))
}

/// Name prefix or all-words match
fn name_clause(name: &str) -> Expr {
    Expr::any_of(vec![
        Expr::prefix("name", name),
        Expr::match_all_words("name", name),
    ])
}

fn apply_type_filters(node: &mut QueryNode, doc_type: Option<&str>, subtype: Option<&str>) {
    if let Some(doc_type) = non_blank(doc_type) {
        node.filter(Expr::term("type", doc_type));
    }
    if let Some(subtype) = non_blank(subtype) {
        node.filter(Expr::term("subtype", subtype));
    }
}

fn apply_passport_filters(node: &mut QueryNode, filters: &[PassportFilter]) {
    for filter in filters {
        node.filter(Expr::terms(filter.document_field(), filter.values.clone()));
    }
}

fn apply_sort(node: &mut QueryNode, sort: Option<&str>) {
    if let Some(spec) = sort.and_then(SortSpec::parse) {
        node.sort(spec);
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(normalize_text).filter(|v| !v.is_empty())
}
