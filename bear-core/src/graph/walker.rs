//! Graph Walker
//!
//! Depth-first traversal of a directed graph that visits every edge
//! reachable from a set of start nodes exactly once and rejects cycles.
//!
//! # Algorithm
//!
//! We keep two sets:
//!
//! - `visited`: nodes that have already been expanded
//! - `path`: nodes on the current DFS stack
//!
//! A node is expanded at most once. While expanding, the edge callback fires
//! for every successor before we descend into it. Reaching a node that is
//! still on `path` means we walked back into our own ancestry, which is a
//! cycle.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::CircularDependencyError;

/// Traverse the graph reachable from `start_nodes`.
///
/// `successors` yields the direct successors of a node and may fail; its
/// error type must be able to carry a [`CircularDependencyError`].
/// `on_edge` is invoked once per `(source, successor)` edge, the first time
/// `source` is expanded.
pub fn traverse_graph<N, I, S, C, E>(
    start_nodes: I,
    mut successors: S,
    mut on_edge: C,
) -> Result<(), E>
where
    N: Clone + Eq + Hash + Debug,
    I: IntoIterator<Item = N>,
    S: FnMut(&N) -> Result<Vec<N>, E>,
    C: FnMut(&N, &N),
    E: From<CircularDependencyError>,
{
    let mut walker = Walker {
        visited: HashSet::new(),
        path: Vec::new(),
        successors: &mut successors,
        on_edge: &mut on_edge,
    };

    for node in start_nodes {
        walker.visit(node)?;
    }

    Ok(())
}

struct Walker<'a, N, S, C> {
    visited: HashSet<N>,
    /// The current DFS stack. Kept ordered so a cycle can be reported.
    path: Vec<N>,
    successors: &'a mut S,
    on_edge: &'a mut C,
}

impl<N, S, C> Walker<'_, N, S, C>
where
    N: Clone + Eq + Hash + Debug,
    C: FnMut(&N, &N),
{
    fn visit<E>(&mut self, node: N) -> Result<(), E>
    where
        S: FnMut(&N) -> Result<Vec<N>, E>,
        E: From<CircularDependencyError>,
    {
        if let Some(position) = self.path.iter().position(|on_path| *on_path == node) {
            let mut cycle: Vec<String> = self.path[position..]
                .iter()
                .map(|n| format!("{n:?}"))
                .collect();
            cycle.push(format!("{node:?}"));
            return Err(CircularDependencyError::new(cycle).into());
        }

        if !self.visited.insert(node.clone()) {
            return Ok(());
        }

        let next = (self.successors)(&node)?;
        self.path.push(node);

        for successor in next {
            if let Some(source) = self.path.last() {
                (self.on_edge)(source, &successor);
            }
            self.visit(successor)?;
        }

        self.path.pop();
        Ok(())
    }
}
