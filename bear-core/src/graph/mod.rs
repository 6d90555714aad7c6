//! Dependency Graph
//!
//! This module implements the directed graph machinery the scheduler is
//! built on.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes represent bears (or bear kinds during initialization)
//! - Edges represent dependencies: if A depends on B, there is an edge from B to A
//!
//! When a bear finishes, we resolve it in the tracker and receive the set of
//! dependants that no longer wait on anything. Those are scheduled next.
//!
//! # Design Decisions
//!
//! 1. Cycle detection is a separate walk ([`traverse_graph`]) rather than a
//!    check on every insert, since the initializer builds the whole graph in
//!    one pass and can validate it while walking.
//!
//! 2. The tracker maintains both forward (dependants) and reverse
//!    (dependencies) edges so that freeing a dependant is a local operation.

mod tracker;
mod walker;

pub use tracker::DependencyTracker;
pub use walker::traverse_graph;
