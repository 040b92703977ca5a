//! Query executor: sends one built query to the store collection of its type.

use crate::error::{FederationError, StoreError};
use crate::federation::CancellationFlag;
use crate::query::QuerySnapshot;
use crate::registry::TypeRegistry;
use crate::result::ExecutedResult;
use crate::store::{SearchRequest, SearchResponse, StoreClient};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Runs a single query snapshot; the federation scheduler drives nodes through it
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn execute(
        &self,
        snapshot: &QuerySnapshot,
        cancel: Option<&CancellationFlag>,
    ) -> Result<ExecutedResult, FederationError>;
}

/// Store-backed query executor
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn StoreClient>,
    registry: Arc<TypeRegistry>,
    timeout: Option<Duration>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn StoreClient>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            store,
            registry,
            timeout: None,
        }
    }

    /// Bound every store call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    async fn search_with_timeout(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let call = self.store.search(collection, request);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => call.await,
        }
    }
}

#[async_trait]
impl QueryRunner for QueryExecutor {
    #[instrument(
        skip(self, snapshot, cancel),
        fields(node = %snapshot.label(), target = %snapshot.target())
    )]
    async fn execute(
        &self,
        snapshot: &QuerySnapshot,
        cancel: Option<&CancellationFlag>,
    ) -> Result<ExecutedResult, FederationError> {
        let collection = self.registry.resolve_collection(snapshot.target())?;
        let request = SearchRequest::from(snapshot);
        let fingerprint = snapshot.fingerprint();
        let started = Instant::now();

        let outcome = match cancel {
            Some(flag) => {
                tokio::select! {
                    response = self.search_with_timeout(collection, &request) => response,
                    _ = flag.cancelled() => Err(StoreError::Cancelled),
                }
            }
            None => self.search_with_timeout(collection, &request).await,
        };

        let response = outcome.map_err(|source| match source {
            StoreError::Cancelled => FederationError::Cancelled,
            source => FederationError::Store {
                node: snapshot.label().to_string(),
                source,
            },
        })?;

        debug!(
            collection,
            backend = self.store.backend_name(),
            fingerprint = %fingerprint,
            from = request.from,
            size = request.size,
            total_hits = response.total_hits,
            returned = response.hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Executed query"
        );

        Ok(ExecutedResult::new(
            response.hits,
            response.aggregations,
            response.total_hits,
            snapshot.page(),
        ))
    }
}
