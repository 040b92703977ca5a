//! Search commands: the plain data objects callers submit.

use crate::types::tags;
use serde::{Deserialize, Serialize};

/// Restrict a passport (metadata) field to any of `values`, e.g. `date.id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportFilter {
    pub field: String,
    pub values: Vec<String>,
}

impl PassportFilter {
    pub fn new<S: Into<String>>(field: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Fully qualified document field
    pub fn document_field(&self) -> String {
        format!("passport.{}", self.field)
    }
}

/// Translation text matched in the given languages; all known languages when empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSpec {
    pub text: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationSpec>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passport: Vec<PassportFilter>,
    /// `field_asc` / `field_desc`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passport: Vec<PassportFilter>,
    /// Only texts with at least one sentence attesting this lemma
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSearch {
    /// Only sentences with a token of this lemma
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    /// Only sentences of texts matching this sub-search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextSearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchCommand {
    Lemma(LemmaSearch),
    Text(TextSearch),
    Sentence(SentenceSearch),
}

impl SearchCommand {
    /// Type tag of the documents the command returns
    pub fn target(&self) -> &'static str {
        match self {
            SearchCommand::Lemma(_) => tags::LEMMA,
            SearchCommand::Text(_) => tags::TEXT,
            SearchCommand::Sentence(_) => tags::SENTENCE,
        }
    }
}
