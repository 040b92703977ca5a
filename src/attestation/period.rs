//! Dating periods and nested attestation summaries.

use crate::document::{Document, Identified, OptionalPassport};
use crate::types::EntityReference;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dating thesaurus entry with its year span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub reference: EntityReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl Period {
    pub fn new(reference: EntityReference) -> Self {
        Self {
            reference,
            begin: None,
            end: None,
        }
    }

    /// Period of a thesaurus document; years come from `passport.timespan.{begin,end}`
    pub fn of(document: &Document) -> Self {
        let year = |field: &str| {
            document
                .passport()
                .and_then(|passport| passport.get(field))
                .and_then(parse_year)
        };
        Self {
            reference: document.reference(),
            begin: year("timespan.begin"),
            end: year("timespan.end"),
        }
    }
}

/// Years are stored as numbers or numeric strings; a passport leaf may also be
/// a single-element list
fn parse_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) if items.len() == 1 => parse_year(&items[0]),
        _ => None,
    }
}

/// One node of a nested attestation summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedAttestation {
    /// `None` only for the synthetic wrapper around several roots
    pub period: Option<Period>,
    /// Occurrences attributed to this period itself
    pub count: u64,
    /// `count` plus the counts of all distinct descendants; an entity reached
    /// through several parents is counted once
    pub total: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedAttestation>,
}

impl NestedAttestation {
    pub fn new(period: Option<Period>, count: u64, children: Vec<NestedAttestation>) -> Self {
        let total = count + children.iter().map(|c| c.total).sum::<u64>();
        Self {
            period,
            count,
            total,
            children,
        }
    }

    /// Node whose `total` was computed by the caller
    pub fn with_total(
        period: Option<Period>,
        count: u64,
        total: u64,
        children: Vec<NestedAttestation>,
    ) -> Self {
        Self {
            period,
            count,
            total,
            children,
        }
    }

    /// Wrapper with no period of its own
    pub fn synthetic(children: Vec<NestedAttestation>) -> Self {
        Self::new(None, 0, children)
    }

    pub fn is_synthetic(&self) -> bool {
        self.period.is_none()
    }

    /// Depth-first search for the node of period `id`
    pub fn find(&self, id: &str) -> Option<&NestedAttestation> {
        if self.period.as_ref().map(|p| p.reference.id()) == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}
