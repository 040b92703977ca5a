//! Federation scheduler: executes a query graph producers-first and hands each
//! producer's result to its consumers before they run.

use super::cancel::CancellationFlag;
use super::graph::{NodeId, QueryGraph};
use crate::error::FederationError;
use crate::executor::QueryRunner;
use crate::query::Page;
use crate::result::ExecutedResult;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Executes one query graph per [`run`](Scheduler::run) call.
///
/// With `max_concurrency == 1` nodes run strictly in execution order. Larger
/// values let independent producers run side by side; a node still starts
/// only once all of its direct producers have completed.
pub struct Scheduler<'a, R: QueryRunner> {
    runner: &'a R,
    max_concurrency: usize,
    cancel: Option<CancellationFlag>,
}

impl<'a, R: QueryRunner> Scheduler<'a, R> {
    /// Strictly sequential scheduler
    pub fn new(runner: &'a R) -> Self {
        Self {
            runner,
            max_concurrency: 1,
            cancel: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check_cancelled(&self) -> Result<(), FederationError> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(FederationError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Execute every producer reachable from `root`, then `root` itself with `page`.
    ///
    /// Producers run unpaged: they only feed aggregations to their consumers.
    /// The first failure aborts the run; in-flight producer calls are dropped.
    #[instrument(skip(self, graph), fields(root = %root, nodes = graph.len()))]
    pub async fn run(
        &self,
        mut graph: QueryGraph,
        root: NodeId,
        page: Page,
    ) -> Result<ExecutedResult, FederationError> {
        let order = graph.resolve_execution_order(root)?;
        let started = Instant::now();
        info!(
            producers = order.len() - 1,
            max_concurrency = self.max_concurrency,
            "Starting query resolution"
        );

        let mut results: Vec<Option<ExecutedResult>> = vec![None; graph.len()];
        let mut launched = vec![false; graph.len()];
        let cancel = self.cancel.as_ref();
        let runner = self.runner;
        let mut in_flight = FuturesUnordered::new();

        loop {
            for &id in &order {
                if in_flight.len() >= self.max_concurrency {
                    break;
                }
                if id == root || launched[id.index()] {
                    continue;
                }
                let ready = graph
                    .producers_of(id)?
                    .iter()
                    .all(|producer| results[producer.index()].is_some());
                if !ready {
                    continue;
                }

                self.check_cancelled()?;
                graph.apply_edges(id, &results)?;
                let snapshot = graph.node(id)?.build(Page::Unpaged)?;
                launched[id.index()] = true;
                debug!(node = %snapshot.label(), "Launching producer");
                in_flight.push(async move {
                    let outcome = runner.execute(&snapshot, cancel).await;
                    (id, outcome)
                });
            }

            match in_flight.next().await {
                Some((id, outcome)) => {
                    let result = outcome?;
                    debug!(
                        node = %graph.node(id)?.label(),
                        total_hits = result.total_hits(),
                        "Producer completed"
                    );
                    results[id.index()] = Some(result);
                }
                None => break,
            }
        }

        self.check_cancelled()?;
        graph.apply_edges(root, &results)?;
        let snapshot = graph.node(root)?.build(page)?;
        let result = runner.execute(&snapshot, cancel).await?;

        info!(
            total_hits = result.total_hits(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query resolution completed"
        );
        Ok(result)
    }
}
