//! Query dependency graph: nodes, dependency edges and execution ordering.

use crate::error::FederationError;
use crate::query::{Expr, QueryNode};
use crate::result::ExecutedResult;
use std::fmt;

/// Handle to a node inside one [`QueryGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type EdgeFn = Box<dyn Fn(&ExecutedResult, &mut QueryNode) + Send + Sync>;

/// Edge from a consumer to the producer whose result feeds it.
///
/// Stored on the consumer. The extract and apply closures are fused into one
/// callback so that edges of different value types share a graph.
pub struct DependencyEdge {
    producer: NodeId,
    resolve: EdgeFn,
}

impl DependencyEdge {
    pub fn producer(&self) -> NodeId {
        self.producer
    }
}

impl fmt::Debug for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyEdge")
            .field("producer", &self.producer)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Request-scoped arena of query nodes and the edges between them
#[derive(Debug, Default)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    edges: Vec<Vec<DependencyEdge>>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: QueryNode) -> NodeId {
        self.nodes.push(node);
        self.edges.push(Vec::new());
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&QueryNode, FederationError> {
        self.nodes
            .get(id.0)
            .ok_or(FederationError::UnknownNode(id.0))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut QueryNode, FederationError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(FederationError::UnknownNode(id.0))
    }

    /// Direct producers of `id`, in registration order
    pub fn producers_of(&self, id: NodeId) -> Result<Vec<NodeId>, FederationError> {
        self.edges
            .get(id.0)
            .map(|edges| edges.iter().map(DependencyEdge::producer).collect())
            .ok_or(FederationError::UnknownNode(id.0))
    }

    /// Register that `consumer` depends on `producer`.
    ///
    /// Once the producer has executed, `extract` reads a value from its result
    /// and `apply` injects it into the consumer. `apply` runs even when the
    /// extracted value is empty.
    pub fn depends_on<V, A, E>(
        &mut self,
        consumer: NodeId,
        producer: NodeId,
        apply: A,
        extract: E,
    ) -> Result<(), FederationError>
    where
        A: Fn(&mut QueryNode, V) + Send + Sync + 'static,
        E: Fn(&ExecutedResult) -> V + Send + Sync + 'static,
    {
        self.node(producer)?;
        let edges = self
            .edges
            .get_mut(consumer.0)
            .ok_or(FederationError::UnknownNode(consumer.0))?;
        edges.push(DependencyEdge {
            producer,
            resolve: Box::new(move |result, node| apply(node, extract(result))),
        });
        Ok(())
    }

    /// Join emulation: filter `consumer` on `field` by the producer's id-handoff buckets
    pub fn filter_by_producer_ids(
        &mut self,
        consumer: NodeId,
        producer: NodeId,
        field: impl Into<String>,
    ) -> Result<(), FederationError> {
        let field = field.into();
        self.depends_on(
            consumer,
            producer,
            move |node, ids: Vec<String>| {
                node.filter(Expr::terms(field.clone(), ids));
            },
            ExecutedResult::id_bucket_keys,
        )
    }

    /// Like [`filter_by_producer_ids`](Self::filter_by_producer_ids) but matching document ids
    pub fn restrict_ids_to_producer(
        &mut self,
        consumer: NodeId,
        producer: NodeId,
    ) -> Result<(), FederationError> {
        self.depends_on(
            consumer,
            producer,
            |node, ids: Vec<String>| {
                node.filter(Expr::Ids(ids));
            },
            ExecutedResult::id_bucket_keys,
        )
    }

    /// Run every edge of `consumer` against the stored producer results
    pub(crate) fn apply_edges(
        &mut self,
        consumer: NodeId,
        results: &[Option<ExecutedResult>],
    ) -> Result<(), FederationError> {
        let consumer_label = self.node(consumer)?.label().to_string();
        let edges = &self.edges[consumer.0];
        for edge in edges {
            if results.get(edge.producer.0).and_then(Option::as_ref).is_none() {
                let producer = self
                    .nodes
                    .get(edge.producer.0)
                    .map(|n| n.label().to_string())
                    .unwrap_or_else(|| edge.producer.to_string());
                return Err(FederationError::MissingProducerResult {
                    producer,
                    consumer: consumer_label,
                });
            }
        }

        let node = &mut self.nodes[consumer.0];
        for edge in edges {
            if let Some(result) = results.get(edge.producer.0).and_then(Option::as_ref) {
                (edge.resolve)(result, node);
            }
        }
        Ok(())
    }

    /// Every node reachable from `root`, producers before their consumers.
    ///
    /// Post-order depth-first traversal; each node appears once and `root`
    /// comes last. Revisiting a node on the current path is a cycle.
    pub fn resolve_execution_order(&self, root: NodeId) -> Result<Vec<NodeId>, FederationError> {
        self.node(root)?;
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::new();
        // (node, index of the next edge to follow)
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        marks[root.0] = Mark::OnPath;

        while let Some(top) = stack.last_mut() {
            let current = top.0;
            let edges = &self.edges[current.0];
            if top.1 < edges.len() {
                let producer = edges[top.1].producer;
                top.1 += 1;
                match marks.get(producer.0).copied() {
                    None => return Err(FederationError::UnknownNode(producer.0)),
                    Some(Mark::Done) => {}
                    Some(Mark::OnPath) => {
                        let start = stack
                            .iter()
                            .position(|(id, _)| *id == producer)
                            .unwrap_or(0);
                        let mut path: Vec<String> = stack[start..]
                            .iter()
                            .map(|(id, _)| self.nodes[id.0].label().to_string())
                            .collect();
                        path.push(self.nodes[producer.0].label().to_string());
                        return Err(FederationError::Cycle { path });
                    }
                    Some(Mark::Unvisited) => {
                        marks[producer.0] = Mark::OnPath;
                        stack.push((producer, 0));
                    }
                }
            } else {
                marks[current.0] = Mark::Done;
                order.push(current);
                stack.pop();
            }
        }

        Ok(order)
    }
}
