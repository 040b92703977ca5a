//! Executed query results, page metadata and aggregation bucket access.

use crate::query::{Page, ID_AGGREGATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One aggregation bucket: a facet value and the number of matches carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub doc_count: u64,
}

impl Bucket {
    pub fn new(key: impl Into<String>, doc_count: u64) -> Self {
        Self {
            key: key.into(),
            doc_count,
        }
    }
}

/// A stored document as returned by the store, before parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub id: String,
    pub source: Value,
}

/// Page metadata reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl PageInfo {
    /// Page metadata for `total_hits` matches.
    ///
    /// `total_pages` is `(total_hits - 1) / size + 1`, so zero hits still
    /// report one page. Unpaged results report a single page.
    pub fn compute(page: Page, total_hits: u64) -> Self {
        match page {
            Page::Paged { number, size } => {
                let size_u64 = size.max(1) as u64;
                Self {
                    number,
                    size,
                    total_elements: total_hits,
                    total_pages: total_hits.saturating_sub(1) / size_u64 + 1,
                }
            }
            Page::Unpaged => Self {
                number: 0,
                size: 0,
                total_elements: total_hits,
                total_pages: 1,
            },
        }
    }
}

/// Result of executing one query node
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedResult {
    hits: Vec<RawHit>,
    aggregations: BTreeMap<String, Vec<Bucket>>,
    total_hits: u64,
    page: Page,
}

impl ExecutedResult {
    pub fn new(
        hits: Vec<RawHit>,
        aggregations: BTreeMap<String, Vec<Bucket>>,
        total_hits: u64,
        page: Page,
    ) -> Self {
        Self {
            hits,
            aggregations,
            total_hits,
            page,
        }
    }

    pub fn hits(&self) -> &[RawHit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<RawHit> {
        self.hits
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo::compute(self.page, self.total_hits)
    }

    pub fn aggregation(&self, name: &str) -> Option<&[Bucket]> {
        self.aggregations.get(name).map(Vec::as_slice)
    }

    pub fn aggregation_names(&self) -> impl Iterator<Item = &str> {
        self.aggregations.keys().map(String::as_str)
    }

    /// `key -> count` for the named aggregation; empty when it is absent
    pub fn bucket_map(&self, name: &str) -> BTreeMap<String, u64> {
        self.aggregation(name)
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|b| (b.key.clone(), b.doc_count))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bucket keys of the id-handoff aggregation, in bucket order
    pub fn id_bucket_keys(&self) -> Vec<String> {
        self.aggregation(ID_AGGREGATION)
            .map(|buckets| buckets.iter().map(|b| b.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Every aggregation except the id handoff, as `name -> key -> count`
    pub fn facets(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.aggregations
            .keys()
            .filter(|name| name.as_str() != ID_AGGREGATION)
            .map(|name| (name.clone(), self.bucket_map(name)))
            .collect()
    }
}

/// Paginated list of items with facet counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    pub page: PageInfo,
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl<T> SearchPage<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> SearchPage<U> {
        SearchPage {
            page: self.page,
            items: self.items.into_iter().map(f).collect(),
            facets: self.facets,
        }
    }
}
