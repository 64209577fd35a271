//! Complete bipartite or complete graph connectivity.

use tracing::{info, instrument};

use crate::{
    edge::{Edge, NodeId},
    filter::{EdgeAccumulator, FilterPolicy},
    params::GraphOptions,
};

/// Parameters of the all-to-all model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AllToAllParams {
    distances: bool,
}

impl AllToAllParams {
    /// Also computes edge lengths when node positions are available.
    #[must_use]
    pub const fn with_distances(mut self, distances: bool) -> Self {
        self.distances = distances;
        self
    }

    /// Returns whether edge lengths are requested.
    #[must_use]
    #[rustfmt::skip]
    pub const fn distances(&self) -> bool { self.distances }
}

/// Connects every source to every target.
///
/// A node present in both sets is never connected to itself. Undirected
/// calls keep one edge per unordered pair.
///
/// # Examples
/// ```
/// use synaptome_core::{GraphOptions, generate_all_to_all};
///
/// let ids = [0, 1, 2];
/// assert_eq!(generate_all_to_all(&ids, &ids, GraphOptions::default()).len(), 6);
/// assert_eq!(generate_all_to_all(&ids, &ids, GraphOptions::undirected()).len(), 3);
/// assert_eq!(generate_all_to_all(&[0, 1], &[1, 2], GraphOptions::default()).len(), 3);
/// ```
#[must_use]
#[instrument(
    name = "generation.all_to_all",
    skip(source_ids, target_ids),
    fields(sources = source_ids.len(), targets = target_ids.len(), directed = options.directed()),
)]
pub fn generate_all_to_all(source_ids: &[NodeId], target_ids: &[NodeId], options: GraphOptions) -> Vec<Edge> {
    let policy = FilterPolicy::new(true, false).with_directed(options.directed());
    let mut accumulator = EdgeAccumulator::with_capacity(policy, source_ids.len() * target_ids.len());
    accumulator.extend(
        source_ids
            .iter()
            .flat_map(|&source| target_ids.iter().map(move |&target| Edge::new(source, target))),
    );
    info!(edges = accumulator.len(), "all-to-all graph generated");
    accumulator.into_edges()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rstest::rstest;

    use crate::test_utils::node_range;

    #[rstest]
    #[case::directed(GraphOptions::default(), 90)]
    #[case::undirected(GraphOptions::undirected(), 45)]
    fn complete_graph_has_every_pair(#[case] options: GraphOptions, #[case] expected: usize) {
        let ids = node_range(10);
        let edges = generate_all_to_all(&ids, &ids, options);
        assert_eq!(edges.len(), expected);
        assert!(edges.iter().all(|edge| !edge.is_self_loop()));
        let canonical: HashSet<Edge> = edges.iter().map(|edge| edge.canonical()).collect();
        assert_eq!(canonical.len(), 45);
    }

    #[rstest]
    fn overlapping_sets_skip_shared_self_pairs() {
        let edges = generate_all_to_all(&[0, 1, 2], &[2, 3], GraphOptions::default());
        assert_eq!(
            edges,
            vec![
                Edge::new(0, 2),
                Edge::new(0, 3),
                Edge::new(1, 2),
                Edge::new(1, 3),
                Edge::new(2, 3),
            ]
        );
    }

    #[rstest]
    fn empty_sets_yield_nothing() {
        assert!(generate_all_to_all(&[], &[1, 2], GraphOptions::default()).is_empty());
    }
}
