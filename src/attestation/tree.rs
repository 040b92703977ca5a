//! Hierarchy reconstruction from materialized ancestor paths.

use super::period::NestedAttestation;
use crate::document::{Identified, OptionalPaths};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Forest over a set of entities, linked through their object paths.
///
/// Each path attaches its entity to the closest ancestor present in the set
/// only, so a multi-hop path creates one edge rather than one per level.
/// Both directions are kept for constant-time parent and child lookups.
#[derive(Debug)]
pub struct AttestationTree<'a, T> {
    nodes: BTreeMap<&'a str, &'a T>,
    parents: BTreeMap<&'a str, BTreeSet<&'a str>>,
    children: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a, T: Identified + OptionalPaths> AttestationTree<'a, T> {
    /// Index `entities` by id (the first of several with the same id wins) and
    /// link each to its nearest indexed ancestor on every one of its paths
    #[instrument(skip(entities))]
    pub fn new(entities: impl IntoIterator<Item = &'a T>) -> Self {
        let started = Instant::now();
        let mut nodes: BTreeMap<&'a str, &'a T> = BTreeMap::new();
        for entity in entities {
            nodes.entry(entity.id()).or_insert(entity);
        }

        let mut parents: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();
        let mut children: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();

        for (&id, &entity) in &nodes {
            for path in entity.paths() {
                let ancestor = path
                    .closest_first()
                    .filter(|segment| segment.id() != id)
                    .find_map(|segment| nodes.get_key_value(segment.id()).map(|(k, _)| *k));
                if let Some(ancestor) = ancestor {
                    parents.entry(id).or_default().insert(ancestor);
                    children.entry(ancestor).or_default().insert(id);
                }
            }
        }

        let edge_count: usize = children.values().map(BTreeSet::len).sum();
        info!(
            node_count = nodes.len(),
            edge_count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Attestation tree built"
        );

        Self {
            nodes,
            parents,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a T> {
        self.nodes.get(id).copied()
    }

    /// Entities with no parent in the set, ordered by id
    pub fn roots(&self) -> Vec<&'a T> {
        self.nodes
            .iter()
            .filter(|(id, _)| self.parents.get(*id).map_or(true, BTreeSet::is_empty))
            .map(|(_, entity)| *entity)
            .collect()
    }

    pub fn children_of(&self, id: &str) -> Vec<&'a T> {
        self.linked(&self.children, id)
    }

    pub fn parents_of(&self, id: &str) -> Vec<&'a T> {
        self.linked(&self.parents, id)
    }

    fn linked(&self, links: &BTreeMap<&'a str, BTreeSet<&'a str>>, id: &str) -> Vec<&'a T> {
        links
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|linked| self.nodes.get(linked).copied())
            .collect()
    }

    /// Fold every root into a nested summary.
    ///
    /// `counts` maps entity id to its own occurrence count (missing ids count
    /// zero); `period_of` describes each entity. Children are ordered by
    /// period begin, then id. An entity with several parents appears under
    /// each of them, but every `total` counts it only once.
    pub fn to_nested<F>(&self, counts: &BTreeMap<String, u64>, period_of: F) -> Vec<NestedAttestation>
    where
        F: Fn(&T) -> super::Period,
    {
        self.fold_roots(counts, &period_of).0
    }

    /// A single-rooted summary: the root itself, a synthetic wrapper around
    /// several roots, or `None` for an empty tree
    pub fn resolve<F>(&self, counts: &BTreeMap<String, u64>, period_of: F) -> Option<NestedAttestation>
    where
        F: Fn(&T) -> super::Period,
    {
        let (mut roots, covered) = self.fold_roots(counts, &period_of);
        debug!(roots = roots.len(), "Resolving attestation forest");
        match roots.len() {
            0 => None,
            1 => roots.pop(),
            _ => Some(NestedAttestation::with_total(
                None,
                0,
                sum_counts(&covered, counts),
                roots,
            )),
        }
    }

    fn fold_roots<F>(
        &self,
        counts: &BTreeMap<String, u64>,
        period_of: &F,
    ) -> (Vec<NestedAttestation>, BTreeSet<&'a str>)
    where
        F: Fn(&T) -> super::Period,
    {
        let mut on_path = BTreeSet::new();
        let mut covered = BTreeSet::new();
        let mut nested = Vec::new();
        for root in self.roots() {
            let (node, reached) = self.fold(root, counts, period_of, &mut on_path);
            covered.extend(reached);
            nested.push(node);
        }
        sort_by_period(&mut nested);
        (nested, covered)
    }

    /// Summary of `entity` plus the ids of the entity and all its descendants
    fn fold<F>(
        &self,
        entity: &'a T,
        counts: &BTreeMap<String, u64>,
        period_of: &F,
        on_path: &mut BTreeSet<&'a str>,
    ) -> (NestedAttestation, BTreeSet<&'a str>)
    where
        F: Fn(&T) -> super::Period,
    {
        let id = entity.id();
        on_path.insert(id);
        let mut covered = BTreeSet::from([id]);
        let mut children = Vec::new();
        for child in self.children_of(id) {
            // Paths may disagree with each other; never descend into an ancestor
            if on_path.contains(child.id()) {
                continue;
            }
            let (node, reached) = self.fold(child, counts, period_of, on_path);
            covered.extend(reached);
            children.push(node);
        }
        on_path.remove(id);
        sort_by_period(&mut children);
        let count = counts.get(id).copied().unwrap_or(0);
        let total = sum_counts(&covered, counts);
        (
            NestedAttestation::with_total(Some(period_of(entity)), count, total, children),
            covered,
        )
    }
}

fn sum_counts(ids: &BTreeSet<&str>, counts: &BTreeMap<String, u64>) -> u64 {
    ids.iter()
        .map(|id| counts.get(*id).copied().unwrap_or(0))
        .sum()
}

fn sort_by_period(nodes: &mut [NestedAttestation]) {
    nodes.sort_by(|a, b| {
        let key = |n: &NestedAttestation| {
            n.period
                .as_ref()
                .map(|p| (p.begin, p.reference.id().to_string()))
        };
        key(a).cmp(&key(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::Period;
    use crate::types::{EntityReference, ObjectPath};

    struct Entry {
        id: &'static str,
        paths: Vec<ObjectPath>,
    }

    impl Entry {
        fn new(id: &'static str, paths: &[&[&str]]) -> Self {
            Self {
                id,
                paths: paths
                    .iter()
                    .map(|segments| {
                        segments
                            .iter()
                            .map(|s| EntityReference::new(*s, "ths"))
                            .collect()
                    })
                    .collect(),
            }
        }
    }

    impl Identified for Entry {
        fn id(&self) -> &str {
            self.id
        }

        fn type_tag(&self) -> &str {
            "ths"
        }
    }

    impl OptionalPaths for Entry {
        fn paths(&self) -> &[ObjectPath] {
            &self.paths
        }
    }

    fn period(entry: &Entry) -> Period {
        Period::new(entry.reference())
    }

    fn ids(entries: Vec<&Entry>) -> Vec<&str> {
        entries.into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn leaf_attaches_to_nearest_ancestor() {
        let entries = vec![
            Entry::new("root", &[]),
            Entry::new("mid", &[&["root"]]),
            Entry::new("leaf", &[&["root", "mid"]]),
        ];
        let tree = AttestationTree::new(&entries);
        assert_eq!(ids(tree.roots()), vec!["root"]);
        assert_eq!(ids(tree.children_of("mid")), vec!["leaf"]);
        assert_eq!(ids(tree.children_of("root")), vec!["mid"]);
        assert_eq!(ids(tree.parents_of("leaf")), vec!["mid"]);
    }

    #[test]
    fn missing_intermediate_falls_back_to_further_ancestor() {
        let entries = vec![Entry::new("root", &[]), Entry::new("leaf", &[&["root", "gone"]])];
        let tree = AttestationTree::new(&entries);
        assert_eq!(ids(tree.children_of("root")), vec!["leaf"]);
    }

    #[test]
    fn entity_without_index_hit_is_root() {
        let entries = vec![Entry::new("a", &[&["x", "y"]]), Entry::new("b", &[])];
        let tree = AttestationTree::new(&entries);
        assert_eq!(ids(tree.roots()), vec!["a", "b"]);
    }

    #[test]
    fn multiple_paths_give_multiple_parents() {
        let entries = vec![
            Entry::new("p1", &[]),
            Entry::new("p2", &[]),
            Entry::new("child", &[&["p1"], &["p2"]]),
        ];
        let tree = AttestationTree::new(&entries);
        assert_eq!(ids(tree.parents_of("child")), vec!["p1", "p2"]);
    }

    #[test]
    fn counts_fold_bottom_up() {
        let entries = vec![
            Entry::new("root", &[]),
            Entry::new("mid", &[&["root"]]),
            Entry::new("leaf", &[&["root", "mid"]]),
        ];
        let tree = AttestationTree::new(&entries);
        let counts: BTreeMap<String, u64> =
            [("mid".to_string(), 2), ("leaf".to_string(), 5)].into_iter().collect();
        let nested = tree.resolve(&counts, period).unwrap();
        assert!(!nested.is_synthetic());
        assert_eq!(nested.count, 0);
        assert_eq!(nested.total, 7);
        assert_eq!(nested.children[0].count, 2);
        assert_eq!(nested.children[0].children[0].total, 5);
    }

    #[test]
    fn several_roots_get_synthetic_wrapper() {
        let entries = vec![Entry::new("a", &[]), Entry::new("b", &[])];
        let tree = AttestationTree::new(&entries);
        let counts: BTreeMap<String, u64> =
            [("a".to_string(), 1), ("b".to_string(), 3)].into_iter().collect();
        let nested = tree.resolve(&counts, period).unwrap();
        assert!(nested.is_synthetic());
        assert_eq!(nested.children.len(), 2);
        assert_eq!(nested.total, 4);
    }

    #[test]
    fn entity_under_two_parents_counts_once() {
        let entries = vec![
            Entry::new("p1", &[]),
            Entry::new("p2", &[]),
            Entry::new("child", &[&["p1"], &["p2"]]),
        ];
        let tree = AttestationTree::new(&entries);
        let counts: BTreeMap<String, u64> = [("child".to_string(), 5)].into_iter().collect();
        let nested = tree.resolve(&counts, period).unwrap();
        assert!(nested.is_synthetic());
        assert_eq!(nested.total, 5);
        assert_eq!(nested.find("p1").unwrap().total, 5);
        assert_eq!(nested.find("p2").unwrap().total, 5);
    }

    #[test]
    fn shared_ancestor_counts_diamond_once() {
        let entries = vec![
            Entry::new("root", &[]),
            Entry::new("a", &[&["root"]]),
            Entry::new("b", &[&["root"]]),
            Entry::new("leaf", &[&["root", "a"], &["root", "b"]]),
        ];
        let tree = AttestationTree::new(&entries);
        let counts: BTreeMap<String, u64> =
            [("a".to_string(), 1), ("leaf".to_string(), 4)].into_iter().collect();
        let nested = tree.resolve(&counts, period).unwrap();
        assert!(!nested.is_synthetic());
        assert_eq!(nested.total, 5);
        assert_eq!(nested.find("a").unwrap().total, 5);
        assert_eq!(nested.find("b").unwrap().total, 4);
    }

    #[test]
    fn empty_tree_resolves_to_none() {
        let entries: Vec<Entry> = vec![];
        let tree = AttestationTree::new(&entries);
        assert!(tree.is_empty());
        assert!(tree.resolve(&BTreeMap::new(), period).is_none());
    }

    #[test]
    fn contradictory_paths_do_not_loop() {
        let entries = vec![Entry::new("a", &[&["b"]]), Entry::new("b", &[&["a"]])];
        let tree = AttestationTree::new(&entries);
        assert!(tree.roots().is_empty());
        assert!(tree.resolve(&BTreeMap::new(), period).is_none());
    }

    #[test]
    fn self_reference_in_path_is_ignored() {
        let entries = vec![Entry::new("root", &[]), Entry::new("leaf", &[&["root", "leaf"]])];
        let tree = AttestationTree::new(&entries);
        assert_eq!(ids(tree.parents_of("leaf")), vec!["root"]);
    }
}
