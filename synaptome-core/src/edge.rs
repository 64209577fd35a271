//! Edge primitives shared by every generator.
//!
//! An [`Edge`] is an ordered `(source, target)` pair of node ids. Undirected
//! generators store each logical edge once; [`Edge::canonical`] gives the
//! orientation-free key used for deduplication in that case.

use std::collections::HashSet;

/// Identifier of a node inside a generation call.
pub type NodeId = usize;

/// A directed connection between two nodes.
///
/// # Examples
/// ```
/// use synaptome_core::Edge;
///
/// let edge = Edge::new(3, 1);
/// assert_eq!(edge.reversed(), Edge::new(1, 3));
/// assert_eq!(edge.canonical(), Edge::new(1, 3));
/// assert!(!edge.is_self_loop());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
}

impl Edge {
    /// Creates an edge from `source` to `target`.
    #[must_use]
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    /// Returns the source node id.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> NodeId { self.source }

    /// Returns the target node id.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> NodeId { self.target }

    /// Returns the edge with its endpoints swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.target, self.source)
    }

    /// Returns the orientation-free form with `source <= target`.
    #[must_use]
    pub const fn canonical(self) -> Self {
        if self.source <= self.target {
            self
        } else {
            self.reversed()
        }
    }

    /// Returns `true` when both endpoints are the same node.
    #[must_use]
    pub const fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl From<(NodeId, NodeId)> for Edge {
    fn from((source, target): (NodeId, NodeId)) -> Self {
        Self::new(source, target)
    }
}

impl From<Edge> for (NodeId, NodeId) {
    fn from(edge: Edge) -> Self {
        (edge.source, edge.target)
    }
}

/// Fraction of directed edges whose reverse edge is also present.
///
/// Duplicate rows are counted once. Returns `0.0` for an empty edge list.
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, reciprocity};
///
/// let edges = [Edge::new(0, 1), Edge::new(1, 0), Edge::new(1, 2), Edge::new(2, 3)];
/// assert_eq!(reciprocity(&edges), 0.5);
/// ```
#[must_use]
pub fn reciprocity(edges: &[Edge]) -> f64 {
    let unique: HashSet<Edge> = edges.iter().copied().collect();
    if unique.is_empty() {
        return 0.0;
    }
    let reciprocal = unique
        .iter()
        .filter(|edge| !edge.is_self_loop() && unique.contains(&edge.reversed()))
        .count();
    reciprocal as f64 / unique.len() as f64
}

/// Counts how many edges point at each node id in `0..node_count`.
///
/// Edges whose target falls outside the range are ignored.
#[must_use]
pub fn in_degrees(edges: &[Edge], node_count: usize) -> Vec<usize> {
    let mut degrees = vec![0usize; node_count];
    for edge in edges {
        if let Some(slot) = degrees.get_mut(edge.target()) {
            *slot += 1;
        }
    }
    degrees
}

/// Counts how many edges leave each node id in `0..node_count`.
///
/// Edges whose source falls outside the range are ignored.
#[must_use]
pub fn out_degrees(edges: &[Edge], node_count: usize) -> Vec<usize> {
    let mut degrees = vec![0usize; node_count];
    for edge in edges {
        if let Some(slot) = degrees.get_mut(edge.source()) {
            *slot += 1;
        }
    }
    degrees
}
