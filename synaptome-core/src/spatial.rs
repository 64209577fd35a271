//! Distance-dependent connectivity.
//!
//! Nodes are connected with a probability that decays with the Euclidean
//! distance between their positions, either until a target edge count is
//! reached or independently per pair with a capped probability.

use std::{collections::HashSet, fmt, str::FromStr, sync::Arc};

use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    arithmetic::{ConnectionSpec, check_num_edges, compute_connections},
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    filter::{EdgeAccumulator, FilterPolicy},
    params::{self, GraphOptions},
    sampling, telemetry,
};

const MODEL: &str = "distance_rule";

/// Decay of the connection probability with distance.
///
/// # Examples
/// ```
/// use synaptome_core::DistanceRule;
///
/// let rule: DistanceRule = "lin".parse()?;
/// assert_eq!(rule.probability(10.0, 2.5), 0.75);
/// assert_eq!(rule.probability(10.0, 20.0), 0.0);
/// assert!("power".parse::<DistanceRule>().is_err());
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DistanceRule {
    /// `exp(-d / scale)`, searched up to `10 · scale`.
    #[default]
    Exponential,
    /// `clip((scale - d) / scale, 0, 1)`, searched up to `scale`.
    Linear,
}

impl DistanceRule {
    /// Returns the short name (`exp` or `lin`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exponential => "exp",
            Self::Linear => "lin",
        }
    }

    /// Connection probability at `distance` for the given `scale`.
    #[must_use]
    pub fn probability(self, scale: f64, distance: f64) -> f64 {
        match self {
            Self::Exponential => (-distance / scale).exp(),
            Self::Linear => ((scale - distance) / scale).clamp(0.0, 1.0),
        }
    }

    /// Half-width of the per-axis search window around each source.
    #[must_use]
    pub fn window(self, scale: f64) -> f64 {
        match self {
            Self::Exponential => 10.0 * scale,
            Self::Linear => scale,
        }
    }
}

impl fmt::Display for DistanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceRule {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "exp" => Ok(Self::Exponential),
            "lin" => Ok(Self::Linear),
            other => Err(GenerationError::UnknownDistanceRule {
                rule: Arc::from(other),
            }),
        }
    }
}

/// Probability used by the capped mode: `max_proba · rule(distance)`.
///
/// # Examples
/// ```
/// use synaptome_core::{DistanceRule, connection_probability};
///
/// let p = connection_probability(DistanceRule::Exponential, 50.0, 1.0, 500.0);
/// assert_eq!(p, (-10.0f64).exp());
/// ```
#[must_use]
pub fn connection_probability(rule: DistanceRule, scale: f64, max_proba: f64, distance: f64) -> f64 {
    max_proba * rule.probability(scale, distance)
}

/// Node coordinates, one row per node id.
///
/// # Examples
/// ```
/// use synaptome_core::Positions;
///
/// let positions = Positions::planar(vec![[0.0, 0.0], [3.0, 4.0]]);
/// assert_eq!(positions.len(), 2);
/// assert_eq!(positions.distance(0, 1)?, 5.0);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Positions {
    dimensions: usize,
    coords: Vec<f64>,
}

impl Positions {
    /// Builds a table from row-major coordinates.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidPositions`] when `dimensions` is zero,
    /// when `coords` is not a whole number of rows, or when a coordinate is
    /// not finite.
    pub fn new(dimensions: usize, coords: Vec<f64>) -> Result<Self> {
        if dimensions == 0 {
            return Err(GenerationError::InvalidPositions {
                reason: "positions need at least one dimension".into(),
            });
        }
        if coords.len() % dimensions != 0 {
            return Err(GenerationError::InvalidPositions {
                reason: format!(
                    "{} coordinates do not split into rows of {dimensions}",
                    coords.len()
                ),
            });
        }
        if let Some(bad) = coords.iter().find(|value| !value.is_finite()) {
            return Err(GenerationError::InvalidPositions {
                reason: format!("coordinate {bad} is not finite"),
            });
        }
        Ok(Self { dimensions, coords })
    }

    /// Builds a two-dimensional table.
    #[must_use]
    pub fn planar(points: Vec<[f64; 2]>) -> Self {
        Self {
            dimensions: 2,
            coords: points.into_iter().flatten().collect(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dimensions
    }

    /// Returns `true` when the table holds no row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of coordinates per row.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Coordinates of `node`.
    ///
    /// # Errors
    /// Returns [`GenerationError::PositionOutOfRange`] when `node` has no row.
    pub fn point(&self, node: NodeId) -> Result<&[f64]> {
        let start = node * self.dimensions;
        self.coords
            .get(start..start + self.dimensions)
            .ok_or(GenerationError::PositionOutOfRange {
                node,
                len: self.len(),
            })
    }

    /// Euclidean distance between two nodes.
    ///
    /// # Errors
    /// Returns [`GenerationError::PositionOutOfRange`] when either node has no
    /// row.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<f64> {
        let left = self.point(a)?;
        let right = self.point(b)?;
        Ok(left
            .iter()
            .zip(right)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt())
    }

    /// Row-major coordinates.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.coords
    }

    fn within_window(&self, a: &[f64], b: &[f64], limit: f64) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() <= limit)
    }

    fn ensure_rows(&self, ids: &[NodeId]) -> Result<()> {
        match ids.iter().find(|&&id| id >= self.len()) {
            Some(&node) => Err(GenerationError::PositionOutOfRange {
                node,
                len: self.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Parameters of the distance-rule model.
///
/// Without `max_proba` the model realises the edge count of `connections`;
/// with it every candidate pair is accepted independently.
///
/// # Examples
/// ```
/// use synaptome_core::{ConnectionSpec, DistanceRule, DistanceRuleParams};
///
/// let params = DistanceRuleParams::new(50.0)?
///     .with_rule(DistanceRule::Linear)
///     .with_connections(ConnectionSpec::from_avg_deg(10.0));
/// assert_eq!(params.rule(), DistanceRule::Linear);
/// assert!(params.max_proba().is_none());
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceRuleParams {
    scale: f64,
    rule: DistanceRule,
    connections: ConnectionSpec,
    max_proba: Option<f64>,
}

impl DistanceRuleParams {
    /// Exponential rule with characteristic length `scale`.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] unless `scale` is finite
    /// and positive.
    pub fn new(scale: f64) -> Result<Self> {
        Ok(Self {
            scale: params::positive("scale", scale)?,
            rule: DistanceRule::default(),
            connections: ConnectionSpec::default(),
            max_proba: None,
        })
    }

    /// Selects the decay rule.
    #[must_use]
    pub const fn with_rule(mut self, rule: DistanceRule) -> Self {
        self.rule = rule;
        self
    }

    /// Sets the edge-count target of the fixed-count mode.
    #[must_use]
    pub const fn with_connections(mut self, connections: ConnectionSpec) -> Self {
        self.connections = connections;
        self
    }

    /// Switches to the capped-probability mode.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] unless `max_proba` lies in
    /// `(0, 1]`.
    pub fn with_max_proba(mut self, max_proba: f64) -> Result<Self> {
        let max_proba = params::probability("max_proba", max_proba)?;
        if max_proba == 0.0 {
            return Err(GenerationError::invalid("max_proba", "must be greater than zero"));
        }
        self.max_proba = Some(max_proba);
        Ok(self)
    }

    /// Returns the characteristic length.
    #[must_use]
    #[rustfmt::skip]
    pub const fn scale(&self) -> f64 { self.scale }

    /// Returns the decay rule.
    #[must_use]
    #[rustfmt::skip]
    pub const fn rule(&self) -> DistanceRule { self.rule }

    /// Returns the edge-count target.
    #[must_use]
    #[rustfmt::skip]
    pub const fn connections(&self) -> ConnectionSpec { self.connections }

    /// Returns the probability ceiling, if the capped mode is selected.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_proba(&self) -> Option<f64> { self.max_proba }
}

/// Edges produced by a spatial generator with their lengths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpatialEdges {
    /// Accepted edges.
    pub edges: Vec<Edge>,
    /// Euclidean length of each edge, aligned with `edges`.
    pub distances: Vec<f64>,
}

/// Euclidean length of every edge.
///
/// # Errors
/// Returns [`GenerationError::PositionOutOfRange`] when an endpoint has no
/// position.
pub fn edge_distances(positions: &Positions, edges: &[Edge]) -> Result<Vec<f64>> {
    edges
        .iter()
        .map(|edge| positions.distance(edge.source(), edge.target()))
        .collect()
}

fn candidates_for(
    source: NodeId,
    target_ids: &[NodeId],
    positions: &Positions,
    limit: f64,
    single_population: bool,
) -> Result<Vec<NodeId>> {
    let origin = positions.point(source)?;
    let mut kept = Vec::new();
    for &target in target_ids {
        if single_population && target == source {
            continue;
        }
        if positions.within_window(origin, positions.point(target)?, limit) {
            kept.push(target);
        }
    }
    Ok(kept)
}

/// Targets inside the search window of each source, in source order.
fn neighbourhoods(
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    positions: &Positions,
    limit: f64,
    single_population: bool,
) -> Result<Vec<Vec<NodeId>>> {
    #[cfg(feature = "parallel")]
    let lists = source_ids
        .par_iter()
        .map(|&source| candidates_for(source, target_ids, positions, limit, single_population))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let lists = source_ids
        .iter()
        .map(|&source| candidates_for(source, target_ids, positions, limit, single_population))
        .collect();
    lists
}

/// Connects nodes with a probability decaying with their distance.
///
/// Positions are indexed by node id. Candidate targets of a source lie within
/// the rule's window on every axis (bounds included); a source is never its
/// own candidate in a single-population call.
///
/// # Errors
/// - [`GenerationError::PositionOutOfRange`] when a node has no position.
/// - Failures of [`compute_connections`] and [`check_num_edges`] in the
///   fixed-count mode.
/// - [`GenerationError::NotEnoughNeighbours`] when the windows hold too few
///   pairs for the edge target.
/// - [`GenerationError::ConvergenceFailure`] when the target is not reached
///   within the retry budget.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{DistanceRuleParams, GraphOptions, Positions, generate_distance_rule};
///
/// let positions = Positions::planar(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
/// let params = DistanceRuleParams::new(100.0)?.with_max_proba(1.0)?;
/// let mut rng = SmallRng::seed_from_u64(4);
/// let ids = [0, 1, 2];
/// let out = generate_distance_rule(&mut rng, &ids, &ids, &params, &positions, GraphOptions::default())?;
/// assert_eq!(out.edges.len(), out.distances.len());
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.distance_rule",
    err,
    skip(rng, source_ids, target_ids, params, positions),
    fields(
        sources = source_ids.len(),
        targets = target_ids.len(),
        rule = %params.rule,
        scale = params.scale,
        capped = params.max_proba.is_some(),
    ),
)]
pub fn generate_distance_rule<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &DistanceRuleParams,
    positions: &Positions,
    options: GraphOptions,
) -> Result<SpatialEdges> {
    positions.ensure_rows(source_ids)?;
    positions.ensure_rows(target_ids)?;

    let target_edges = match params.max_proba {
        Some(_) => 0,
        None => {
            compute_connections(
                source_ids.len(),
                target_ids.len(),
                &params.connections,
                options.directed(),
                None,
            )?
            .edges
        }
    };
    let single_population = check_num_edges(
        source_ids,
        target_ids,
        target_edges,
        options.directed(),
        options.multigraph(),
    )?;
    let limit = params.rule.window(params.scale);
    let lists = neighbourhoods(source_ids, target_ids, positions, limit, single_population)?;

    let policy = FilterPolicy::new(single_population, options.multigraph()).with_directed(options.directed());
    let mut accumulator = EdgeAccumulator::tracking_distances(policy, target_edges);
    match params.max_proba {
        Some(max_proba) => {
            capped(rng, source_ids, &lists, params, max_proba, positions, options.directed(), &mut accumulator)?;
        }
        None => fixed_count(rng, source_ids, &lists, params, positions, target_edges, options, &mut accumulator)?,
    }

    let (edges, distances) = accumulator.into_parts();
    let out = SpatialEdges {
        edges,
        distances: distances.unwrap_or_default(),
    };
    info!(edges = out.edges.len(), "distance-rule graph generated");
    Ok(out)
}

/// One Bernoulli draw per candidate pair. Undirected graphs draw once per
/// unordered pair, whichever orientation is met first.
#[expect(clippy::too_many_arguments, reason = "private helper threading the call state")]
fn capped<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    lists: &[Vec<NodeId>],
    params: &DistanceRuleParams,
    max_proba: f64,
    positions: &Positions,
    directed: bool,
    accumulator: &mut EdgeAccumulator,
) -> Result<()> {
    telemetry::record_round(MODEL);
    let mut drawn: HashSet<Edge> = HashSet::new();
    for (&source, candidates) in source_ids.iter().zip(lists) {
        let mut edges = Vec::new();
        let mut distances = Vec::new();
        for &target in candidates {
            if !directed && !drawn.insert(Edge::new(source, target).canonical()) {
                continue;
            }
            let distance = positions.distance(source, target)?;
            let probability = connection_probability(params.rule, params.scale, max_proba, distance);
            if rng.r#gen::<f64>() < probability {
                edges.push(Edge::new(source, target));
                distances.push(distance);
            }
        }
        accumulator.extend_with_distances(&edges, &distances)?;
    }
    Ok(())
}

#[expect(clippy::too_many_arguments, reason = "private helper threading the call state")]
fn fixed_count<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    lists: &[Vec<NodeId>],
    params: &DistanceRuleParams,
    positions: &Positions,
    target: usize,
    options: GraphOptions,
    accumulator: &mut EdgeAccumulator,
) -> Result<()> {
    if target == 0 {
        return Ok(());
    }
    let neighbours: usize = lists.iter().map(Vec::len).sum();
    if neighbours <= target {
        return Err(GenerationError::NotEnoughNeighbours {
            neighbours,
            edges: target,
        });
    }

    let mut attempts = 0usize;
    while accumulator.len() < target && attempts < options.retry_budget().max_attempts() {
        telemetry::record_round(MODEL);
        let missing = target - accumulator.len();
        let mut edges = Vec::new();
        let mut distances = Vec::new();
        for (&source, candidates) in source_ids.iter().zip(lists) {
            if candidates.is_empty() {
                continue;
            }
            let trials = (candidates.len() * missing / neighbours).max(1);
            for _ in 0..trials {
                let target_id = candidates[rng.gen_range(0..candidates.len())];
                let distance = positions.distance(source, target_id)?;
                if rng.r#gen::<f64>() < params.rule.probability(params.scale, distance) {
                    edges.push(Edge::new(source, target_id));
                    distances.push(distance);
                }
            }
        }
        if edges.len() > missing {
            let keep = sampling::distinct_indices(rng, edges.len(), missing);
            edges = keep.iter().map(|&index| edges[index]).collect();
            distances = keep.iter().map(|&index| distances[index]).collect();
        }
        let added = accumulator.extend_with_distances(&edges, &distances)?;
        debug!(added, accepted = accumulator.len(), target, "distance-rule round");
        attempts += 1;
    }
    if accumulator.len() < target {
        return Err(GenerationError::ConvergenceFailure {
            model: MODEL,
            accepted: accumulator.len(),
            target,
            attempts,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rstest::{fixture, rstest};

    use crate::{
        GenerationErrorCode,
        test_utils::{node_range, seeded_rng},
    };

    #[fixture]
    fn grid() -> Positions {
        let points = (0..100)
            .map(|index| [f64::from(index % 10) * 10.0, f64::from(index / 10) * 10.0])
            .collect();
        Positions::planar(points)
    }

    #[rstest]
    fn far_pair_uses_exact_exponential_probability() {
        let positions = Positions::planar(vec![[0.0, 0.0], [500.0, 0.0]]);
        let params = DistanceRuleParams::new(50.0)
            .expect("valid scale")
            .with_max_proba(1.0)
            .expect("valid ceiling");
        let probability = connection_probability(DistanceRule::Exponential, 50.0, 1.0, 500.0);
        assert_eq!(probability, (-10.0f64).exp());

        for seed in 0..64 {
            let draw = seeded_rng(seed).r#gen::<f64>();
            let mut rng = seeded_rng(seed);
            let out = generate_distance_rule(&mut rng, &[0], &[1], &params, &positions, GraphOptions::default())
                .expect("valid call");
            assert_eq!(out.edges.is_empty(), draw >= probability);
        }
    }

    #[rstest]
    #[case::directed(GraphOptions::default(), 2)]
    #[case::undirected(GraphOptions::undirected(), 1)]
    fn capped_pairs_connect_with_rule_probability(#[case] options: GraphOptions, #[case] draws_per_pair: i32) {
        let scale = 10.0;
        let positions = Positions::planar(vec![[0.0, 0.0], [scale * std::f64::consts::LN_2, 0.0]]);
        let params = DistanceRuleParams::new(scale)
            .expect("valid scale")
            .with_max_proba(1.0)
            .expect("valid ceiling");
        let runs = 4000;
        let connected = (0..runs)
            .filter(|&seed| {
                let mut rng = seeded_rng(seed);
                let out = generate_distance_rule(&mut rng, &[0, 1], &[0, 1], &params, &positions, options)
                    .expect("valid call");
                !out.edges.is_empty()
            })
            .count();
        let frequency = connected as f64 / runs as f64;
        let expected = 1.0 - 0.5f64.powi(draws_per_pair);
        assert!((frequency - expected).abs() < 0.04, "frequency {frequency}, expected {expected}");
    }

    #[rstest]
    fn undirected_capped_graph_stores_each_pair_once(grid: Positions) {
        let ids = node_range(100);
        let params = DistanceRuleParams::new(15.0)
            .expect("valid scale")
            .with_max_proba(0.9)
            .expect("valid ceiling");
        let mut rng = seeded_rng(8);
        let out = generate_distance_rule(&mut rng, &ids, &ids, &params, &grid, GraphOptions::undirected())
            .expect("valid call");
        let unique: HashSet<Edge> = out.edges.iter().map(|edge| edge.canonical()).collect();
        assert_eq!(unique.len(), out.edges.len());
        assert_eq!(out.distances.len(), out.edges.len());
    }

    #[rstest]
    fn window_bounds_are_inclusive() {
        let positions = Positions::planar(vec![[0.0, 0.0], [500.0, 500.0], [500.1, 0.0]]);
        let lists = neighbourhoods(&[0], &[1, 2], &positions, 500.0, false).expect("rows exist");
        assert_eq!(lists, vec![vec![1]]);
    }

    #[rstest]
    #[case::exponential(DistanceRule::Exponential)]
    #[case::linear(DistanceRule::Linear)]
    fn fixed_count_mode_reaches_target(grid: Positions, #[case] rule: DistanceRule) {
        let ids = node_range(100);
        let params = DistanceRuleParams::new(30.0)
            .expect("valid scale")
            .with_rule(rule)
            .with_connections(ConnectionSpec::from_edges(300));
        let mut rng = seeded_rng(17);
        let out = generate_distance_rule(&mut rng, &ids, &ids, &params, &grid, GraphOptions::default())
            .expect("feasible");

        assert_eq!(out.edges.len(), 300);
        assert_eq!(out.distances.len(), 300);
        let unique: HashSet<Edge> = out.edges.iter().copied().collect();
        assert_eq!(unique.len(), 300);
        for (edge, distance) in out.edges.iter().zip(&out.distances) {
            assert!(!edge.is_self_loop());
            let expected = grid.distance(edge.source(), edge.target()).expect("rows exist");
            assert_eq!(*distance, expected);
            assert!(*distance <= rule.window(30.0) * std::f64::consts::SQRT_2);
        }
    }

    #[rstest]
    fn small_scale_reports_missing_neighbours(grid: Positions) {
        let ids = node_range(100);
        let params = DistanceRuleParams::new(1.0)
            .expect("valid scale")
            .with_rule(DistanceRule::Linear)
            .with_connections(ConnectionSpec::from_edges(50));
        let mut rng = seeded_rng(17);
        let err = generate_distance_rule(&mut rng, &ids, &ids, &params, &grid, GraphOptions::default())
            .expect_err("no neighbour within one unit");
        assert_eq!(err, GenerationError::NotEnoughNeighbours { neighbours: 0, edges: 50 });
    }

    #[rstest]
    fn missing_rows_are_reported() {
        let positions = Positions::planar(vec![[0.0, 0.0]]);
        let params = DistanceRuleParams::new(1.0).expect("valid").with_max_proba(0.5).expect("valid");
        let mut rng = seeded_rng(1);
        let err = generate_distance_rule(&mut rng, &[0, 3], &[0, 3], &params, &positions, GraphOptions::default())
            .expect_err("row 3 is missing");
        assert_eq!(err, GenerationError::PositionOutOfRange { node: 3, len: 1 });
    }

    #[rstest]
    #[case(0, vec![1.0, 2.0])]
    #[case(2, vec![1.0, 2.0, 3.0])]
    #[case(1, vec![f64::NAN])]
    fn malformed_tables_are_rejected(#[case] dimensions: usize, #[case] coords: Vec<f64>) {
        let err = Positions::new(dimensions, coords).expect_err("malformed");
        assert_eq!(err.code(), GenerationErrorCode::InvalidPositions);
    }

    #[rstest]
    fn unknown_rule_is_rejected() {
        let err = "gauss".parse::<DistanceRule>().expect_err("unknown");
        assert_eq!(err.code(), GenerationErrorCode::UnknownDistanceRule);
    }
}
