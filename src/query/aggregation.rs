//! Aggregation requests attached to a query node.

use serde::{Deserialize, Serialize};

/// Reserved aggregation name under which producer nodes publish their ids
pub const ID_AGGREGATION: &str = "__ids";

/// Default number of buckets for facet aggregations
pub const DEFAULT_FACET_SIZE: usize = 50;

/// A terms aggregation: bucket documents by the distinct values of `field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub name: String,
    pub field: String,
    pub size: usize,
    /// When set, buckets count nested objects under this path instead of documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_path: Option<String>,
}

impl AggregationSpec {
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            size: DEFAULT_FACET_SIZE,
            nested_path: None,
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn nested(mut self, path: impl Into<String>) -> Self {
        self.nested_path = Some(path.into());
        self
    }

    /// The id-handoff aggregation used by producer nodes
    pub fn ids(field: impl Into<String>, size: usize) -> Self {
        Self::terms(ID_AGGREGATION, field).size(size)
    }

    pub fn is_id_handoff(&self) -> bool {
        self.name == ID_AGGREGATION
    }
}
