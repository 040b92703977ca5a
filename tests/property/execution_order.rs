//! Property-based tests for query graph execution order

use proptest::prelude::*;
use scriptorium::federation::{NodeId, QueryGraph};
use scriptorium::query::QueryNode;
use std::collections::{BTreeSet, HashMap};

/// Graph where node `i` may only depend on nodes with a larger index, so it is acyclic
fn build_dag(size: usize, edges: &[(usize, usize)]) -> (QueryGraph, Vec<NodeId>) {
    let mut graph = QueryGraph::new();
    let ids: Vec<NodeId> = (0..size)
        .map(|i| graph.add(QueryNode::new("text").labeled(format!("n{}", i))))
        .collect();
    let mut seen = BTreeSet::new();
    for &(a, b) in edges {
        let (consumer, producer) = (a.min(b) % size, a.max(b) % size);
        if consumer != producer && seen.insert((consumer, producer)) {
            graph
                .restrict_ids_to_producer(ids[consumer], ids[producer])
                .unwrap();
        }
    }
    (graph, ids)
}

fn reachable(graph: &QueryGraph, root: NodeId) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if seen.insert(node.index()) {
            stack.extend(graph.producers_of(node).unwrap());
        }
    }
    seen
}

/// Every producer precedes its consumer, the root comes last and each
/// reachable node appears exactly once
#[test]
fn test_execution_order_is_topological() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..12, prop::collection::vec((0usize..12, 0usize..12), 0..30)),
            |(size, edges)| {
                let (graph, ids) = build_dag(size, &edges);
                let root = ids[0];
                let order = graph.resolve_execution_order(root).unwrap();

                prop_assert_eq!(*order.last().unwrap(), root);

                let position: HashMap<usize, usize> = order
                    .iter()
                    .enumerate()
                    .map(|(pos, id)| (id.index(), pos))
                    .collect();
                prop_assert_eq!(position.len(), order.len(), "no duplicates");

                let expected = reachable(&graph, root);
                let actual: BTreeSet<usize> = position.keys().copied().collect();
                prop_assert_eq!(actual, expected);

                for &node in &order {
                    for producer in graph.producers_of(node).unwrap() {
                        prop_assert!(position[&producer.index()] < position[&node.index()]);
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Closing any chain back onto its head is reported as a cycle
#[test]
fn test_back_edge_is_always_a_cycle() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(2usize..10), |length| {
            let mut graph = QueryGraph::new();
            let ids: Vec<NodeId> = (0..length)
                .map(|i| graph.add(QueryNode::new("text").labeled(format!("n{}", i))))
                .collect();
            for pair in ids.windows(2) {
                graph.restrict_ids_to_producer(pair[0], pair[1]).unwrap();
            }
            graph
                .restrict_ids_to_producer(ids[length - 1], ids[0])
                .unwrap();

            let err = graph.resolve_execution_order(ids[0]).unwrap_err();
            let message = err.to_string();
            prop_assert!(message.contains("cycle"), "unexpected error: {}", message);
            Ok(())
        })
        .unwrap();
}
