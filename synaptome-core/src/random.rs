//! Uniform and scale-free random topologies.
//!
//! Both generators size their batches with [`compute_connections`], draw a
//! pre-reciprocal edge set through the [`EdgeAccumulator`], then reflect
//! random accepted edges until the reciprocity target is met.

use rand::{Rng, seq::SliceRandom};
use rand_distr::{Distribution, Pareto};
use tracing::{debug, info, instrument};

use crate::{
    arithmetic::{ConnectionCounts, ConnectionSpec, check_num_edges, compute_connections},
    edge::{Edge, NodeId, reciprocity},
    error::{GenerationError, Result},
    filter::{EdgeAccumulator, FilterPolicy},
    params::{self, GraphOptions},
    sampling, telemetry,
};

/// Parameters of the Erdős–Rényi model.
///
/// # Examples
/// ```
/// use synaptome_core::{ConnectionSpec, ErdosRenyiParams};
///
/// let params = ErdosRenyiParams::new(ConnectionSpec::from_density(0.1)).with_reciprocity(0.3);
/// assert_eq!(params.reciprocity(), Some(0.3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErdosRenyiParams {
    connections: ConnectionSpec,
    reciprocity: Option<f64>,
}

impl ErdosRenyiParams {
    /// Uniform random graph sized by `connections`.
    #[must_use]
    pub const fn new(connections: ConnectionSpec) -> Self {
        Self {
            connections,
            reciprocity: None,
        }
    }

    /// Requests a fraction of reciprocal edges (directed graphs only).
    #[must_use]
    pub const fn with_reciprocity(mut self, reciprocity: f64) -> Self {
        self.reciprocity = Some(reciprocity);
        self
    }

    /// Returns the edge-count target.
    #[must_use]
    #[rustfmt::skip]
    pub const fn connections(&self) -> ConnectionSpec { self.connections }

    /// Returns the requested reciprocity.
    #[must_use]
    #[rustfmt::skip]
    pub const fn reciprocity(&self) -> Option<f64> { self.reciprocity }
}

/// Parameters of the random scale-free model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomScaleFreeParams {
    in_exp: f64,
    out_exp: f64,
    connections: ConnectionSpec,
    reciprocity: Option<f64>,
}

impl RandomScaleFreeParams {
    /// Power-law in- and out-degrees with the given exponents, at density 0.1
    /// unless overridden.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when an exponent is not
    /// strictly positive.
    ///
    /// # Examples
    /// ```
    /// use synaptome_core::{ConnectionSpec, RandomScaleFreeParams};
    ///
    /// let params = RandomScaleFreeParams::new(2.1, 2.5)?.with_connections(ConnectionSpec::from_edges(300));
    /// assert_eq!(params.connections().edges(), Some(300));
    /// assert!(RandomScaleFreeParams::new(0.0, 2.0).is_err());
    /// # Ok::<(), synaptome_core::GenerationError>(())
    /// ```
    pub fn new(in_exp: f64, out_exp: f64) -> Result<Self> {
        Ok(Self {
            in_exp: params::positive("in_exp", in_exp)?,
            out_exp: params::positive("out_exp", out_exp)?,
            connections: ConnectionSpec::from_density(0.1),
            reciprocity: None,
        })
    }

    /// Replaces the edge-count target.
    #[must_use]
    pub const fn with_connections(mut self, connections: ConnectionSpec) -> Self {
        self.connections = connections;
        self
    }

    /// Requests a fraction of reciprocal edges (directed graphs only).
    #[must_use]
    pub const fn with_reciprocity(mut self, reciprocity: f64) -> Self {
        self.reciprocity = Some(reciprocity);
        self
    }

    /// Returns the in-degree exponent.
    #[must_use]
    #[rustfmt::skip]
    pub const fn in_exp(&self) -> f64 { self.in_exp }

    /// Returns the out-degree exponent.
    #[must_use]
    #[rustfmt::skip]
    pub const fn out_exp(&self) -> f64 { self.out_exp }

    /// Returns the edge-count target.
    #[must_use]
    #[rustfmt::skip]
    pub const fn connections(&self) -> ConnectionSpec { self.connections }

    /// Returns the requested reciprocity.
    #[must_use]
    #[rustfmt::skip]
    pub const fn reciprocity(&self) -> Option<f64> { self.reciprocity }
}

/// Sized and validated edge budget shared by both random models.
struct Plan {
    counts: ConnectionCounts,
    policy: FilterPolicy,
    reflect: bool,
}

fn plan(
    model: &'static str,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    connections: &ConnectionSpec,
    reciprocity: Option<f64>,
    options: GraphOptions,
) -> Result<Plan> {
    let counts = compute_connections(
        source_ids.len(),
        target_ids.len(),
        connections,
        options.directed(),
        reciprocity,
    )?;
    let single_population = check_num_edges(
        source_ids,
        target_ids,
        counts.edges,
        options.directed(),
        options.multigraph(),
    )?;
    let reflect = options.directed() && reciprocity.is_some_and(|value| value > 0.0);
    if reflect && !single_population {
        return Err(GenerationError::SinglePopulationRequired { model });
    }
    Ok(Plan {
        counts,
        policy: FilterPolicy::new(single_population, options.multigraph()).with_directed(options.directed()),
        reflect,
    })
}

fn convergence(model: &'static str, accepted: usize, target: usize, attempts: usize) -> GenerationError {
    GenerationError::ConvergenceFailure {
        model,
        accepted,
        target,
        attempts,
    }
}

/// Adds reversed copies of random pre-reciprocal edges until `target` edges
/// are accepted.
fn reflect_edges<R: Rng + ?Sized>(
    rng: &mut R,
    model: &'static str,
    accumulator: &mut EdgeAccumulator,
    target: usize,
    options: GraphOptions,
) -> Result<()> {
    let originals = accumulator.len();
    if originals == 0 {
        return Ok(());
    }
    let mut attempts = 0usize;
    while accumulator.len() < target && attempts < options.retry_budget().max_attempts() {
        telemetry::record_round(model);
        let missing = target - accumulator.len();
        let proposal: Vec<Edge> = (0..missing)
            .map(|_| accumulator.edges()[rng.gen_range(0..originals)].reversed())
            .collect();
        let added = accumulator.extend(proposal);
        debug!(added, accepted = accumulator.len(), target, "reciprocal round");
        attempts += 1;
    }
    if accumulator.len() < target {
        return Err(convergence(model, accumulator.len(), target, attempts));
    }
    Ok(())
}

/// Uniform random graph with optional reciprocity.
///
/// Pairs are drawn uniformly from `source_ids × target_ids` until the
/// pre-reciprocal budget is met, then reversed copies of random accepted edges
/// are added until the full edge count is reached.
///
/// # Errors
/// - Failures of [`compute_connections`] and [`check_num_edges`].
/// - [`GenerationError::SinglePopulationRequired`] when a reciprocity is
///   requested between two populations.
/// - [`GenerationError::ConvergenceFailure`] when the retry budget runs out.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{ConnectionSpec, ErdosRenyiParams, GraphOptions, generate_erdos_renyi};
///
/// let mut rng = SmallRng::seed_from_u64(3);
/// let ids: Vec<usize> = (0..30).collect();
/// let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(90));
/// let edges = generate_erdos_renyi(&mut rng, &ids, &ids, &params, GraphOptions::default())?;
/// assert_eq!(edges.len(), 90);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.erdos_renyi",
    err,
    skip(rng, source_ids, target_ids, params),
    fields(
        sources = source_ids.len(),
        targets = target_ids.len(),
        reciprocity = ?params.reciprocity,
        directed = options.directed(),
    ),
)]
pub fn generate_erdos_renyi<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &ErdosRenyiParams,
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    const MODEL: &str = "erdos_renyi";
    if source_ids.is_empty() || target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let plan = plan(MODEL, source_ids, target_ids, &params.connections, params.reciprocity, options)?;
    let pre = plan.counts.pre_reciprocal_edges;
    let mut accumulator = EdgeAccumulator::with_capacity(plan.policy, plan.counts.edges);

    let mut attempts = 0usize;
    while accumulator.len() < pre && attempts < options.retry_budget().max_attempts() {
        telemetry::record_round(MODEL);
        let missing = pre - accumulator.len();
        let proposal: Vec<Edge> = (0..missing)
            .map(|_| {
                let source = source_ids[rng.gen_range(0..source_ids.len())];
                let target = target_ids[rng.gen_range(0..target_ids.len())];
                Edge::new(source, target)
            })
            .collect();
        let added = accumulator.extend(proposal);
        debug!(added, accepted = accumulator.len(), target = pre, "uniform round");
        attempts += 1;
    }
    if accumulator.len() < pre {
        return Err(convergence(MODEL, accumulator.len(), pre, attempts));
    }
    if plan.reflect {
        reflect_edges(rng, MODEL, &mut accumulator, plan.counts.edges, options)?;
    }

    let edges = accumulator.into_edges();
    info!(edges = edges.len(), reciprocity = reciprocity(&edges), "erdos-renyi graph generated");
    Ok(edges)
}

/// Draws `count` Pareto weights and rescales them to integers summing to
/// `total`.
fn power_law_degrees<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    exponent: f64,
    total: usize,
    options: GraphOptions,
) -> Result<Vec<usize>> {
    const MODEL: &str = "random_scale_free";
    let pareto = Pareto::new(1.0, exponent)
        .map_err(|error| GenerationError::invalid("exponent", error.to_string()))?;
    let weights: Vec<f64> = (0..count).map(|_| pareto.sample(rng)).collect();
    let weight_sum: f64 = weights.iter().sum();
    let mut degrees: Vec<i64> = weights
        .iter()
        .map(|weight| (total as f64 / weight_sum * weight).round() as i64)
        .collect();

    let target = total as i64;
    let mut attempts = 0usize;
    loop {
        let sum: i64 = degrees.iter().sum();
        let diff = sum - target;
        if diff == 0 {
            break;
        }
        if attempts >= options.retry_budget().max_attempts() {
            return Err(convergence(MODEL, sum.max(0) as usize, total, attempts));
        }
        for _ in 0..diff.unsigned_abs() {
            let index = rng.gen_range(0..count);
            degrees[index] = (degrees[index] - diff.signum()).max(0);
        }
        attempts += 1;
    }
    Ok(degrees.into_iter().map(|degree| degree.max(0) as usize).collect())
}

/// Random graph whose in- and out-degrees follow power laws.
///
/// # Errors
/// Same failure modes as [`generate_erdos_renyi`].
#[instrument(
    name = "generation.random_scale_free",
    err,
    skip(rng, source_ids, target_ids, params),
    fields(
        sources = source_ids.len(),
        targets = target_ids.len(),
        in_exp = params.in_exp,
        out_exp = params.out_exp,
        directed = options.directed(),
    ),
)]
pub fn generate_random_scale_free<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &RandomScaleFreeParams,
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    const MODEL: &str = "random_scale_free";
    if source_ids.is_empty() || target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let plan = plan(MODEL, source_ids, target_ids, &params.connections, params.reciprocity, options)?;
    let pre = plan.counts.pre_reciprocal_edges;

    let in_degrees = power_law_degrees(rng, target_ids.len(), params.in_exp, pre, options)?;
    let out_degrees = power_law_degrees(rng, source_ids.len(), params.out_exp, pre, options)?;
    let stub_sources = sampling::repeat_by(source_ids, &out_degrees);
    let mut stub_targets = sampling::repeat_by(target_ids, &in_degrees);
    stub_targets.shuffle(rng);

    let mut accumulator = EdgeAccumulator::with_capacity(plan.policy, plan.counts.edges);
    telemetry::record_round(MODEL);
    accumulator.extend(
        stub_sources
            .iter()
            .zip(&stub_targets)
            .map(|(&source, &target)| Edge::new(source, target)),
    );

    let mut attempts = 0usize;
    while accumulator.len() < pre && attempts < options.retry_budget().max_attempts() {
        telemetry::record_round(MODEL);
        let missing = pre - accumulator.len();
        let proposal: Vec<Edge> = (0..missing)
            .filter_map(|_| {
                let source = stub_sources.choose(rng)?;
                let target = stub_targets.choose(rng)?;
                Some(Edge::new(*source, *target))
            })
            .collect();
        let added = accumulator.extend(proposal);
        debug!(added, accepted = accumulator.len(), target = pre, "scale-free top-up round");
        attempts += 1;
    }
    if accumulator.len() < pre {
        return Err(convergence(MODEL, accumulator.len(), pre, attempts));
    }
    if plan.reflect {
        reflect_edges(rng, MODEL, &mut accumulator, plan.counts.edges, options)?;
    }

    let edges = accumulator.into_edges();
    info!(edges = edges.len(), "random scale-free graph generated");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rstest::rstest;

    use crate::{
        GenerationErrorCode, RetryBudget,
        test_utils::{node_range, seeded_rng},
    };

    fn assert_simple(edges: &[Edge]) {
        let unique: HashSet<Edge> = edges.iter().copied().collect();
        assert_eq!(unique.len(), edges.len());
        assert!(edges.iter().all(|edge| !edge.is_self_loop()));
    }

    #[rstest]
    #[case::seed_1(1)]
    #[case::seed_7(7)]
    #[case::seed_31(31)]
    fn erdos_renyi_hits_reciprocity_target(#[case] seed: u64) {
        let ids = node_range(200);
        let mut rng = seeded_rng(seed);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_density(0.05)).with_reciprocity(0.5);
        let edges = generate_erdos_renyi(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect("feasible");

        assert_eq!(edges.len(), 2000);
        assert!((edges.len() as f64 - 200.0 * 199.0 * 0.05).abs() / 1990.0 < 0.01);
        assert_simple(&edges);
        let measured = reciprocity(&edges);
        assert!((0.44..=0.56).contains(&measured), "reciprocity {measured}");
    }

    #[rstest]
    fn undirected_erdos_renyi_stores_each_pair_once() {
        let ids = node_range(30);
        let mut rng = seeded_rng(4);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(200));
        let edges = generate_erdos_renyi(&mut rng, &ids, &ids, &params, GraphOptions::undirected())
            .expect("feasible");
        assert_eq!(edges.len(), 100);
        let canonical: HashSet<Edge> = edges.iter().map(|edge| edge.canonical()).collect();
        assert_eq!(canonical.len(), 100);
    }

    #[rstest]
    fn multigraph_erdos_renyi_exceeds_simple_capacity() {
        let ids = node_range(5);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(50));
        let mut rng = seeded_rng(6);
        let edges = generate_erdos_renyi(&mut rng, &ids, &ids, &params, GraphOptions::default().with_multigraph(true))
            .expect("multigraphs have no ceiling");
        assert_eq!(edges.len(), 50);
        assert!(edges.iter().all(|edge| !edge.is_self_loop()));
        let distinct: HashSet<Edge> = edges.iter().copied().collect();
        assert!(distinct.len() <= 20);

        let err = generate_erdos_renyi(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect_err("a simple digraph on five nodes holds twenty edges");
        assert_eq!(err, GenerationError::TooManyEdges { requested: 50, capacity: 20 });
    }

    #[rstest]
    fn two_population_edges_stay_bipartite() {
        let sources = [0, 1, 2, 3];
        let targets = [4, 5, 6];
        let mut rng = seeded_rng(9);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(10));
        let edges = generate_erdos_renyi(&mut rng, &sources, &targets, &params, GraphOptions::default())
            .expect("feasible");
        assert_eq!(edges.len(), 10);
        assert!(edges
            .iter()
            .all(|edge| sources.contains(&edge.source()) && targets.contains(&edge.target())));
    }

    #[rstest]
    fn reciprocity_between_populations_is_rejected() {
        let mut rng = seeded_rng(9);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(4)).with_reciprocity(0.5);
        let err = generate_erdos_renyi(&mut rng, &[0, 1, 2], &[3, 4, 5], &params, GraphOptions::default())
            .expect_err("two populations");
        assert_eq!(err, GenerationError::SinglePopulationRequired { model: "erdos_renyi" });
    }

    #[rstest]
    fn empty_population_is_a_no_op() {
        let mut rng = seeded_rng(9);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(4));
        let edges = generate_erdos_renyi(&mut rng, &[], &[1, 2], &params, GraphOptions::default())
            .expect("no-op");
        assert!(edges.is_empty());
    }

    #[rstest]
    fn exhausted_budget_is_reported() {
        let ids = node_range(3);
        let mut rng = seeded_rng(12);
        let budget = RetryBudget::new(1).expect("non-zero");
        let params = ErdosRenyiParams::new(ConnectionSpec::from_edges(6));
        let err = generate_erdos_renyi(
            &mut rng,
            &ids,
            &ids,
            &params,
            GraphOptions::default().with_retry_budget(budget),
        )
        .expect_err("a complete digraph cannot be drawn in one round");
        assert_eq!(err.code(), GenerationErrorCode::ConvergenceFailure);
    }

    #[rstest]
    #[case::seed_5(5)]
    #[case::seed_6(6)]
    fn scale_free_reaches_edge_target(#[case] seed: u64) {
        let ids = node_range(100);
        let mut rng = seeded_rng(seed);
        let params = RandomScaleFreeParams::new(2.2, 2.2)
            .expect("valid exponents")
            .with_connections(ConnectionSpec::from_edges(500));
        let edges = generate_random_scale_free(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect("feasible");
        assert_eq!(edges.len(), 500);
        assert_simple(&edges);
    }

    #[rstest]
    fn scale_free_supports_reciprocity() {
        let ids = node_range(100);
        let mut rng = seeded_rng(77);
        let params = RandomScaleFreeParams::new(2.5, 2.5)
            .expect("valid exponents")
            .with_connections(ConnectionSpec::from_density(0.05))
            .with_reciprocity(0.4);
        let edges = generate_random_scale_free(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect("feasible");
        assert_eq!(edges.len(), 500);
        assert_simple(&edges);
        assert!(reciprocity(&edges) > 0.2);
    }

    #[rstest]
    fn power_law_degrees_sum_to_target() {
        let mut rng = seeded_rng(13);
        let degrees = power_law_degrees(&mut rng, 64, 1.8, 321, GraphOptions::default())
            .expect("converges");
        assert_eq!(degrees.iter().sum::<usize>(), 321);
    }
}
