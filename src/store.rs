//! Document store contract
//!
//! The engine talks to the backing store only through [`StoreClient`]:
//! one single-collection search and one bulk multi-get. Backends translate
//! the boolean filter tree into whatever the store understands.

pub mod eval;
pub mod http;
pub mod memory;
pub mod persistence;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use persistence::SledStore;

use crate::error::StoreError;
use crate::query::{AggregationSpec, Expr, QuerySnapshot, SortSpec};
use crate::result::{Bucket, RawHit};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// One search against one collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: Expr,
    pub aggregations: Vec<AggregationSpec>,
    pub sort: Vec<SortSpec>,
    pub from: usize,
    pub size: usize,
}

impl From<&QuerySnapshot> for SearchRequest {
    fn from(snapshot: &QuerySnapshot) -> Self {
        let page = snapshot.page();
        Self {
            query: snapshot.query().clone(),
            aggregations: snapshot.aggregations().to_vec(),
            sort: snapshot.sort().to_vec(),
            from: page.offset(),
            size: page.fetch_size(),
        }
    }
}

/// Raw search response: the requested hit window, bucket lists, total match count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub hits: Vec<RawHit>,
    pub aggregations: BTreeMap<String, Vec<Bucket>>,
    pub total_hits: u64,
}

/// Document store client interface
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError>;

    /// Fetch documents by id; ids that do not exist are silently absent
    async fn multi_get(&self, collection: &str, ids: &[String]) -> Result<Vec<RawHit>, StoreError>;

    /// Backend name for logs
    fn backend_name(&self) -> &str;
}
