//! Corpus documents
//!
//! A document is a small core (`id`, type tag, subtype, name, edit info) plus
//! optional parts a concrete kind may carry: relations, a passport (metadata
//! tree), object paths and tokens. Consumers ask for a part through the
//! capability traits below instead of probing the document kind.

use crate::error::DocumentError;
use crate::types::{DocumentId, EntityReference, ObjectPath, TypeTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Edit provenance of a stored document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// Typed outgoing references, keyed by predicate (`partOf`, `contains`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relations(BTreeMap<String, Vec<EntityReference>>);

impl Relations {
    pub fn new(relations: BTreeMap<String, Vec<EntityReference>>) -> Self {
        Self(relations)
    }

    pub fn get(&self, predicate: &str) -> &[EntityReference] {
        self.0.get(predicate).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn references(&self) -> impl Iterator<Item = &EntityReference> {
        self.0.values().flatten()
    }
}

/// Free-form metadata tree attached to a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passport(Value);

impl Passport {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look up a dotted path (`timespan.begin`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |current, key| current.get(key))
    }

    /// Reference objects embedded anywhere in the metadata tree.
    ///
    /// A reference object is any JSON object with string `id` and `type`
    /// members; its subtree is not searched further.
    pub fn references(&self) -> Vec<EntityReference> {
        let mut found = Vec::new();
        collect_embedded_references(&self.0, &mut found);
        found
    }
}

fn collect_embedded_references(value: &Value, found: &mut Vec<EntityReference>) {
    match value {
        Value::Object(map) => {
            if let (Some(Value::String(id)), Some(Value::String(type_tag))) =
                (map.get("id"), map.get("type"))
            {
                let mut reference = EntityReference::new(id.clone(), type_tag.clone());
                if let Some(Value::String(name)) = map.get("name") {
                    reference = reference.with_name(name.clone());
                }
                found.push(reference);
                return;
            }
            for child in map.values() {
                collect_embedded_references(child, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_embedded_references(item, found);
            }
        }
        _ => {}
    }
}

/// Link from a token to the lemma it attests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaLink {
    pub id: DocumentId,
}

/// One token of a sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<LemmaLink>,
}

/// A document read from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Entity type tag; assigned from the collection the document was read from
    #[serde(skip_deserializing, default)]
    pub kind: TypeTag,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "editors", default, skip_serializing_if = "Option::is_none")]
    pub edit_info: Option<EditInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Relations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport: Option<Passport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<ObjectPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<Token>>,
}

impl Document {
    /// Parse a stored payload for the given type tag.
    ///
    /// A missing `id` member falls back to `fallback_id` (the store-level id).
    pub fn from_source(
        type_tag: &str,
        fallback_id: Option<&str>,
        source: Value,
    ) -> Result<Self, DocumentError> {
        let mut source = source;
        if let Value::Object(map) = &mut source {
            if !map.contains_key("id") {
                match fallback_id {
                    Some(id) => {
                        map.insert("id".to_string(), Value::String(id.to_string()));
                    }
                    None => {
                        return Err(DocumentError::MissingId {
                            type_tag: type_tag.to_string(),
                        })
                    }
                }
            }
        }
        let mut document: Document = serde_json::from_value(source)?;
        if document.id.is_empty() {
            return Err(DocumentError::MissingId {
                type_tag: type_tag.to_string(),
            });
        }
        document.kind = type_tag.to_string();
        Ok(document)
    }

    /// Every typed reference this document points at: relations, passport
    /// reference objects and token lemma links, in that order, duplicates kept.
    pub fn outgoing_references(&self) -> Vec<EntityReference> {
        let mut references: Vec<EntityReference> = Vec::new();
        if let Some(relations) = self.relations() {
            references.extend(relations.references().cloned());
        }
        if let Some(passport) = self.passport() {
            references.extend(passport.references());
        }
        if let Some(tokens) = &self.tokens {
            references.extend(tokens.iter().filter_map(|token| {
                token
                    .lemma
                    .as_ref()
                    .map(|lemma| EntityReference::new(lemma.id.clone(), crate::types::tags::LEMMA))
            }));
        }
        references
    }
}

/// Anything addressable by id and type tag
pub trait Identified {
    fn id(&self) -> &str;
    fn type_tag(&self) -> &str;

    fn reference(&self) -> EntityReference {
        EntityReference::new(self.id(), self.type_tag())
    }
}

/// Kinds that may carry typed relations
pub trait OptionalRelations {
    fn relations(&self) -> Option<&Relations>;
}

/// Kinds that may carry a passport
pub trait OptionalPassport {
    fn passport(&self) -> Option<&Passport>;
}

/// Kinds that may carry materialized ancestor paths
pub trait OptionalPaths {
    fn paths(&self) -> &[ObjectPath];
}

impl Identified for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn type_tag(&self) -> &str {
        &self.kind
    }

    fn reference(&self) -> EntityReference {
        let reference = EntityReference::new(self.id.clone(), self.kind.clone());
        match &self.name {
            Some(name) => reference.with_name(name.clone()),
            None => reference,
        }
    }
}

impl OptionalRelations for Document {
    fn relations(&self) -> Option<&Relations> {
        self.relations.as_ref()
    }
}

impl OptionalPassport for Document {
    fn passport(&self) -> Option<&Passport> {
        self.passport.as_ref()
    }
}

impl OptionalPaths for Document {
    fn paths(&self) -> &[ObjectPath] {
        &self.paths
    }
}
