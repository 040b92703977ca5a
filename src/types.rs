//! Shared corpus identifiers: entity references, text ranges and object paths.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Document identifier as stored in the document store
pub type DocumentId = String;

/// Entity type tag (`lemma`, `text`, `ths`, ...)
pub type TypeTag = String;

/// Type tags of the corpus entity kinds
pub mod tags {
    pub const LEMMA: &str = "lemma";
    pub const TEXT: &str = "text";
    pub const SUBTEXT: &str = "subtext";
    pub const CORPUS: &str = "corpus";
    pub const SENTENCE: &str = "sentence";
    pub const THS: &str = "ths";
    pub const ANNOTATION: &str = "annotation";
    pub const COMMENT: &str = "comment";

    /// All built-in type tags, in registration order
    pub const ALL: [&str; 8] = [LEMMA, TEXT, SUBTEXT, CORPUS, SENTENCE, THS, ANNOTATION, COMMENT];
}

/// A token range inside a text, addressed by first and last token id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub from: String,
    pub to: String,
}

impl TextRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Pointer to a document without its payload.
///
/// Equality and hashing cover the id, the type tag and the *set* of ranges;
/// the display name is ignored, range order is insignificant and duplicate
/// ranges collapse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityReference {
    id: DocumentId,
    #[serde(rename = "type")]
    type_tag: TypeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    ranges: BTreeSet<TextRange>,
}

impl EntityReference {
    pub fn new(id: impl Into<DocumentId>, type_tag: impl Into<TypeTag>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            name: None,
            ranges: BTreeSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_ranges(mut self, ranges: impl IntoIterator<Item = TextRange>) -> Self {
        self.ranges.extend(ranges);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ranges(&self) -> impl Iterator<Item = &TextRange> {
        self.ranges.iter()
    }
}

impl PartialEq for EntityReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.type_tag == other.type_tag && self.ranges == other.ranges
    }
}

impl Eq for EntityReference {}

impl Hash for EntityReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.type_tag.hash(state);
        self.ranges.hash(state);
    }
}

/// One materialized root-to-node ancestry chain (e.g. corpus → text → subtext)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(Vec<EntityReference>);

impl ObjectPath {
    pub fn new(segments: Vec<EntityReference>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[EntityReference] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments from the closest ancestor back to the root
    pub fn closest_first(&self) -> impl Iterator<Item = &EntityReference> {
        self.0.iter().rev()
    }
}

impl FromIterator<EntityReference> for ObjectPath {
    fn from_iter<I: IntoIterator<Item = EntityReference>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
