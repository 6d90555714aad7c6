//! Dependency Tracker
//!
//! Tracks which nodes are waiting on which other nodes and tells the caller
//! which waiters become free when a node is resolved.
//!
//! # Representation
//!
//! Edges run from a dependency to its dependants. We keep both directions:
//!
//! - `forward`: dependency -> dependants
//! - `reverse`: dependant -> dependencies
//!
//! so that `resolve` can decide in O(1) per neighbour whether a dependant
//! still waits on anything. A node with no remaining edges is not stored at
//! all, which makes "nothing left to resolve" simply "both maps are empty".

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use super::walker::traverse_graph;
use crate::error::CircularDependencyError;

/// A directed multimap of dependency -> dependant edges.
#[derive(Debug, Clone)]
pub struct DependencyTracker<T>
where
    T: Clone + Eq + Hash + Debug,
{
    forward: IndexMap<T, IndexSet<T>>,
    reverse: IndexMap<T, IndexSet<T>>,
}

impl<T> DependencyTracker<T>
where
    T: Clone + Eq + Hash + Debug,
{
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            forward: IndexMap::new(),
            reverse: IndexMap::new(),
        }
    }

    /// Record that `dependant` waits on `dependency`.
    ///
    /// Adding an existing edge again has no effect. Cycles are not checked
    /// here, see [`check_circular_dependencies`](Self::check_circular_dependencies).
    pub fn add(&mut self, dependency: T, dependant: T) {
        self.forward
            .entry(dependency.clone())
            .or_default()
            .insert(dependant.clone());
        self.reverse.entry(dependant).or_default().insert(dependency);
    }

    /// Direct dependants of `dependency`.
    pub fn get_dependants(&self, dependency: &T) -> IndexSet<T> {
        self.forward.get(dependency).cloned().unwrap_or_default()
    }

    /// Direct dependencies of `dependant`.
    pub fn get_dependencies(&self, dependant: &T) -> IndexSet<T> {
        self.reverse.get(dependant).cloned().unwrap_or_default()
    }

    /// Every node that directly or indirectly depends on `dependency`.
    pub fn get_all_dependants(
        &self,
        dependency: &T,
    ) -> Result<IndexSet<T>, CircularDependencyError> {
        Self::closure(dependency, &self.forward)
    }

    /// Every node that `dependant` directly or indirectly depends on.
    pub fn get_all_dependencies(
        &self,
        dependant: &T,
    ) -> Result<IndexSet<T>, CircularDependencyError> {
        Self::closure(dependant, &self.reverse)
    }

    fn closure(
        start: &T,
        edges: &IndexMap<T, IndexSet<T>>,
    ) -> Result<IndexSet<T>, CircularDependencyError> {
        let mut reached = IndexSet::new();
        traverse_graph(
            [start.clone()],
            |node: &T| -> Result<Vec<T>, CircularDependencyError> {
                Ok(edges
                    .get(node)
                    .map(|next| next.iter().cloned().collect())
                    .unwrap_or_default())
            },
            |_: &T, next: &T| {
                reached.insert(next.clone());
            },
        )?;
        Ok(reached)
    }

    /// All nodes that still have dependants.
    pub fn dependencies(&self) -> impl Iterator<Item = &T> {
        self.forward.keys()
    }

    /// All nodes that still wait on something.
    pub fn dependants(&self) -> impl Iterator<Item = &T> {
        self.reverse.keys()
    }

    /// Whether `node` still waits on at least one dependency.
    pub fn has_dependencies(&self, node: &T) -> bool {
        self.reverse.contains_key(node)
    }

    /// Remove `dependency` from the graph and return the dependants it freed.
    ///
    /// Edges pointing *into* `dependency` are dropped as well, so a node that
    /// still has unresolved dependencies can be force-removed; that side never
    /// frees anything. A dependant is freed when `dependency` was its last
    /// remaining dependency. Resolving an unknown node returns an empty set.
    pub fn resolve(&mut self, dependency: &T) -> IndexSet<T> {
        if let Some(upstream) = self.reverse.shift_remove(dependency) {
            for node in upstream {
                if let Some(dependants) = self.forward.get_mut(&node) {
                    dependants.shift_remove(dependency);
                    if dependants.is_empty() {
                        self.forward.shift_remove(&node);
                    }
                }
            }
        }

        let mut freed = IndexSet::new();
        for dependant in self.forward.shift_remove(dependency).unwrap_or_default() {
            if let Some(remaining) = self.reverse.get_mut(&dependant) {
                remaining.shift_remove(dependency);
                if remaining.is_empty() {
                    self.reverse.shift_remove(&dependant);
                    freed.insert(dependant);
                }
            }
        }

        freed
    }

    /// Fail if any cycle is reachable from a tracked dependency.
    pub fn check_circular_dependencies(&self) -> Result<(), CircularDependencyError> {
        traverse_graph(
            self.forward.keys().cloned(),
            |node: &T| -> Result<Vec<T>, CircularDependencyError> {
                Ok(self
                    .forward
                    .get(node)
                    .map(|next| next.iter().cloned().collect())
                    .unwrap_or_default())
            },
            |_: &T, _: &T| {},
        )
    }

    /// True when no edges are left.
    pub fn are_dependencies_resolved(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterate over every `(dependency, dependant)` edge once.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.forward
            .iter()
            .flat_map(|(dependency, dependants)| dependants.iter().map(move |d| (dependency, d)))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.forward.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<T> Default for DependencyTracker<T>
where
    T: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a DependencyTracker<T>
where
    T: Clone + Eq + Hash + Debug,
{
    type Item = (&'a T, &'a T);
    type IntoIter = Box<dyn Iterator<Item = (&'a T, &'a T)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&'static str]) -> IndexSet<&'static str> {
        items.iter().copied().collect()
    }

    #[test]
    fn add_and_query_neighbours() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");
        tracker.add("a", "c");
        tracker.add("b", "c");

        assert_eq!(tracker.get_dependants(&"a"), set(&["b", "c"]));
        assert_eq!(tracker.get_dependencies(&"c"), set(&["a", "b"]));
        assert!(tracker.get_dependencies(&"a").is_empty());
        assert_eq!(tracker.dependencies().copied().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(tracker.dependants().copied().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");
        tracker.add("a", "b");

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.iter().collect::<Vec<_>>(), [(&"a", &"b")]);
    }

    #[test]
    fn transitive_closures() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");
        tracker.add("b", "c");
        tracker.add("b", "d");
        tracker.add("x", "d");

        assert_eq!(tracker.get_all_dependants(&"a").unwrap(), set(&["b", "c", "d"]));
        assert_eq!(tracker.get_all_dependencies(&"d").unwrap(), set(&["b", "a", "x"]));
        assert!(tracker.get_all_dependants(&"unknown").unwrap().is_empty());
    }

    #[test]
    fn resolve_frees_dependant_without_other_dependencies() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");

        assert_eq!(tracker.resolve(&"a"), set(&["b"]));
        assert!(tracker.are_dependencies_resolved());
        assert!(tracker.is_empty());
    }

    #[test]
    fn resolve_keeps_dependant_with_pending_dependencies() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "c");
        tracker.add("b", "c");

        assert!(tracker.resolve(&"a").is_empty());
        assert!(tracker.has_dependencies(&"c"));
        assert_eq!(tracker.resolve(&"b"), set(&["c"]));
        assert!(tracker.are_dependencies_resolved());
    }

    #[test]
    fn resolve_twice_is_idempotent() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");

        assert_eq!(tracker.resolve(&"a"), set(&["b"]));
        assert!(tracker.resolve(&"a").is_empty());
        assert!(tracker.resolve(&"never-added").is_empty());
    }

    #[test]
    fn forced_resolve_removes_incoming_edges() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");
        tracker.add("b", "c");
        tracker.add("x", "c");

        // "b" still waits on "a", remove it anyway.
        assert!(tracker.resolve(&"b").is_empty());
        assert!(tracker.get_dependants(&"a").is_empty());
        assert_eq!(tracker.get_dependencies(&"c"), set(&["x"]));

        assert!(tracker.resolve(&"c").is_empty());
        assert!(tracker.are_dependencies_resolved());
    }

    #[test]
    fn circular_dependencies_are_reported() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "b");
        tracker.add("b", "c");
        assert!(tracker.check_circular_dependencies().is_ok());

        tracker.add("c", "a");
        let error = tracker.check_circular_dependencies().unwrap_err();
        assert_eq!(error.cycle().first(), error.cycle().last());
        assert!(tracker.get_all_dependants(&"a").is_err());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut tracker = DependencyTracker::new();
        tracker.add("a", "a");
        assert!(tracker.check_circular_dependencies().is_err());
    }
}
