//! Incremental edge filtering.
//!
//! Every generator proposes candidate edges in batches and pushes them through
//! an [`EdgeAccumulator`]. The accumulator drops self-loops for
//! single-population calls and, unless multigraphs are allowed, rejects any
//! edge it has already accepted. Rows are never reordered, so an auxiliary
//! per-edge scalar such as the spatial distance stays aligned with the
//! surviving edges.

use std::collections::HashSet;

use crate::{
    edge::Edge,
    error::{GenerationError, Result},
    telemetry,
};

/// Rules applied by an [`EdgeAccumulator`].
///
/// # Examples
/// ```
/// use synaptome_core::FilterPolicy;
///
/// let policy = FilterPolicy::new(true, false).with_directed(false);
/// assert!(policy.single_population());
/// assert!(!policy.multigraph());
/// assert!(!policy.directed());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterPolicy {
    single_population: bool,
    multigraph: bool,
    directed: bool,
}

impl FilterPolicy {
    /// Creates a directed policy.
    #[must_use]
    pub const fn new(single_population: bool, multigraph: bool) -> Self {
        Self {
            single_population,
            multigraph,
            directed: true,
        }
    }

    /// Treats `(u, v)` and `(v, u)` as the same edge when `directed` is false.
    #[must_use]
    pub const fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Returns whether self-loops are dropped.
    #[must_use]
    #[rustfmt::skip]
    pub const fn single_population(&self) -> bool { self.single_population }

    /// Returns whether duplicate edges are kept.
    #[must_use]
    #[rustfmt::skip]
    pub const fn multigraph(&self) -> bool { self.multigraph }

    /// Returns whether edge orientation matters for deduplication.
    #[must_use]
    #[rustfmt::skip]
    pub const fn directed(&self) -> bool { self.directed }

    fn key(self, edge: Edge) -> Edge {
        if self.directed {
            edge
        } else {
            edge.canonical()
        }
    }
}

/// Growable edge set that enforces a [`FilterPolicy`] on every insertion.
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, EdgeAccumulator, FilterPolicy};
///
/// let mut accumulator = EdgeAccumulator::new(FilterPolicy::new(true, false));
/// let added = accumulator.extend([
///     Edge::new(0, 1),
///     Edge::new(1, 1),
///     Edge::new(0, 1),
///     Edge::new(1, 0),
/// ]);
/// assert_eq!(added, 2);
/// assert_eq!(accumulator.edges(), &[Edge::new(0, 1), Edge::new(1, 0)]);
/// ```
#[derive(Clone, Debug)]
pub struct EdgeAccumulator {
    policy: FilterPolicy,
    edges: Vec<Edge>,
    seen: HashSet<Edge>,
    distances: Option<Vec<f64>>,
}

impl EdgeAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new(policy: FilterPolicy) -> Self {
        Self::with_capacity(policy, 0)
    }

    /// Creates an empty accumulator with room for `capacity` edges.
    #[must_use]
    pub fn with_capacity(policy: FilterPolicy, capacity: usize) -> Self {
        Self {
            policy,
            edges: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(if policy.multigraph { 0 } else { capacity }),
            distances: None,
        }
    }

    /// Creates an empty accumulator that keeps one distance per edge.
    #[must_use]
    pub fn tracking_distances(policy: FilterPolicy, capacity: usize) -> Self {
        let mut accumulator = Self::with_capacity(policy, capacity);
        accumulator.distances = Some(Vec::with_capacity(capacity));
        accumulator
    }

    /// Builds an accumulator from edges that were already accepted.
    ///
    /// Self-loops in `accepted` are kept, duplicates collapse onto their first
    /// occurrence unless the policy allows multigraphs.
    #[must_use]
    pub fn from_accepted(policy: FilterPolicy, accepted: Vec<Edge>) -> Self {
        let mut accumulator = Self::with_capacity(policy, accepted.len());
        for edge in accepted {
            accumulator.push_unchecked_loop(edge, None);
        }
        accumulator
    }

    /// Returns the policy enforced by this accumulator.
    #[must_use]
    #[rustfmt::skip]
    pub const fn policy(&self) -> FilterPolicy { self.policy }

    /// Number of accepted edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether no edge has been accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Accepted edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Distances aligned with [`Self::edges`], when tracked.
    #[must_use]
    pub fn distances(&self) -> Option<&[f64]> {
        self.distances.as_deref()
    }

    /// Returns whether `edge` (or its reverse, for undirected policies) was
    /// already accepted.
    #[must_use]
    pub fn contains(&self, edge: Edge) -> bool {
        if self.policy.multigraph {
            self.edges
                .iter()
                .any(|known| self.policy.key(*known) == self.policy.key(edge))
        } else {
            self.seen.contains(&self.policy.key(edge))
        }
    }

    /// Attempts to add a single edge, returning whether it was accepted.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.policy.single_population && edge.is_self_loop() {
            return false;
        }
        self.push_unchecked_loop(edge, None)
    }

    /// Filters a batch of proposed edges into the accumulator and returns how
    /// many were accepted.
    ///
    /// When distances are tracked, rows added through this method record
    /// `NaN`; use [`Self::extend_with_distances`] to keep real values.
    pub fn extend<I>(&mut self, proposed: I) -> usize
    where
        I: IntoIterator<Item = Edge>,
    {
        let before = self.edges.len();
        let mut offered = 0usize;
        for edge in proposed {
            offered += 1;
            self.insert(edge);
        }
        let added = self.edges.len() - before;
        telemetry::record_rejected(offered - added);
        added
    }

    /// Filters a batch of proposed edges together with their distances.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when `distances` does not
    /// hold one value per proposed edge.
    pub fn extend_with_distances(&mut self, proposed: &[Edge], distances: &[f64]) -> Result<usize> {
        if proposed.len() != distances.len() {
            return Err(GenerationError::invalid(
                "distances",
                format!(
                    "{} distances supplied for {} edges",
                    distances.len(),
                    proposed.len()
                ),
            ));
        }
        if self.distances.is_none() {
            self.distances = Some(vec![f64::NAN; self.edges.len()]);
        }
        let before = self.edges.len();
        for (&edge, &distance) in proposed.iter().zip(distances) {
            if self.policy.single_population && edge.is_self_loop() {
                continue;
            }
            self.push_unchecked_loop(edge, Some(distance));
        }
        let added = self.edges.len() - before;
        telemetry::record_rejected(proposed.len() - added);
        Ok(added)
    }

    /// Removes the rows at `indices` and returns the removed edges.
    ///
    /// Indices out of range or repeated are ignored. The relative order of the
    /// remaining rows is preserved.
    pub fn remove_indices(&mut self, indices: &[usize]) -> Vec<Edge> {
        let doomed: HashSet<usize> = indices
            .iter()
            .copied()
            .filter(|&index| index < self.edges.len())
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::with_capacity(doomed.len());
        let mut kept = Vec::with_capacity(self.edges.len() - doomed.len());
        let mut kept_distances = self
            .distances
            .as_ref()
            .map(|distances| Vec::with_capacity(distances.len()));
        for (index, edge) in self.edges.iter().copied().enumerate() {
            if doomed.contains(&index) {
                removed.push(edge);
                continue;
            }
            kept.push(edge);
            if let (Some(out), Some(distances)) = (kept_distances.as_mut(), self.distances.as_ref()) {
                out.push(distances.get(index).copied().unwrap_or(f64::NAN));
            }
        }
        if !self.policy.multigraph {
            for edge in &removed {
                self.seen.remove(&self.policy.key(*edge));
            }
        }
        self.edges = kept;
        self.distances = kept_distances;
        removed
    }

    /// Consumes the accumulator and returns its edges.
    #[must_use]
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    /// Consumes the accumulator and returns its edges and tracked distances.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Edge>, Option<Vec<f64>>) {
        (self.edges, self.distances)
    }

    fn push_unchecked_loop(&mut self, edge: Edge, distance: Option<f64>) -> bool {
        if !self.policy.multigraph && !self.seen.insert(self.policy.key(edge)) {
            return false;
        }
        self.edges.push(edge);
        if let Some(distances) = self.distances.as_mut() {
            distances.push(distance.unwrap_or(f64::NAN));
        }
        true
    }
}

/// Filters `proposed` into an already accepted edge list.
///
/// Self-loops in `proposed` are dropped for single-population calls. Unless
/// `multigraph` is set, duplicate rows across the whole result collapse onto
/// their first occurrence. The returned vector's length is the new accepted
/// count.
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, filter_edges};
///
/// let accepted = vec![Edge::new(0, 1)];
/// let proposed = [Edge::new(0, 1), Edge::new(2, 2), Edge::new(2, 0)];
/// let edges = filter_edges(accepted, &proposed, true, false);
/// assert_eq!(edges, vec![Edge::new(0, 1), Edge::new(2, 0)]);
/// ```
#[must_use]
pub fn filter_edges(
    accepted: Vec<Edge>,
    proposed: &[Edge],
    single_population: bool,
    multigraph: bool,
) -> Vec<Edge> {
    let policy = FilterPolicy::new(single_population, multigraph);
    let mut accumulator = EdgeAccumulator::from_accepted(policy, accepted);
    accumulator.extend(proposed.iter().copied());
    accumulator.into_edges()
}

/// Distance-tracking variant of [`filter_edges`].
///
/// Distances attached to dropped rows are discarded so the returned vectors
/// stay aligned.
///
/// # Errors
/// Returns [`GenerationError::InvalidParameter`] when either distance slice
/// does not match its edge slice in length.
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, filter_edges_with_distances};
///
/// let (edges, distances) = filter_edges_with_distances(
///     vec![Edge::new(0, 1)],
///     vec![1.5],
///     &[Edge::new(0, 1), Edge::new(1, 2)],
///     &[1.5, 4.0],
///     true,
///     false,
/// )?;
/// assert_eq!(edges, vec![Edge::new(0, 1), Edge::new(1, 2)]);
/// assert_eq!(distances, vec![1.5, 4.0]);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn filter_edges_with_distances(
    accepted: Vec<Edge>,
    accepted_distances: Vec<f64>,
    proposed: &[Edge],
    proposed_distances: &[f64],
    single_population: bool,
    multigraph: bool,
) -> Result<(Vec<Edge>, Vec<f64>)> {
    if accepted.len() != accepted_distances.len() {
        return Err(GenerationError::invalid(
            "distances",
            format!(
                "{} distances supplied for {} accepted edges",
                accepted_distances.len(),
                accepted.len()
            ),
        ));
    }
    let policy = FilterPolicy::new(single_population, multigraph);
    let mut accumulator = EdgeAccumulator::tracking_distances(policy, accepted.len());
    for (edge, distance) in accepted.into_iter().zip(accepted_distances) {
        accumulator.push_unchecked_loop(edge, Some(distance));
    }
    accumulator.extend_with_distances(proposed, proposed_distances)?;
    let (edges, distances) = accumulator.into_parts();
    Ok((edges, distances.unwrap_or_default()))
}
