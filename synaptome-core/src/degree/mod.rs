//! Generation from an explicit per-node degree sequence.
//!
//! In- and out-degree sequences are realised independently per anchor node by
//! drawing distinct partners. Total-degree (and undirected) sequences share
//! both endpoints' budgets, so they are checked with the Erdős–Gallai test
//! and realised by stub matching, with a bounded repair step once progress
//! stalls.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use rand::{Rng, seq::SliceRandom};
use tracing::{debug, info, instrument, warn};

use crate::{
    arithmetic::{check_num_edges, is_single_population},
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    filter::{EdgeAccumulator, FilterPolicy},
    params::GraphOptions,
    sampling, telemetry,
};

const MODEL: &str = "from_degree_list";

/// Which degree a sequence constrains.
///
/// # Examples
/// ```
/// use synaptome_core::DegreeType;
///
/// assert_eq!("in-degree".parse::<DegreeType>()?, DegreeType::In);
/// assert_eq!(DegreeType::Total.to_string(), "total");
/// assert!("sideways".parse::<DegreeType>().is_err());
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DegreeType {
    /// Number of incoming edges of each anchor node.
    #[default]
    In,
    /// Number of outgoing edges of each anchor node.
    Out,
    /// Number of incident edges, regardless of direction.
    Total,
}

impl DegreeType {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for DegreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DegreeType {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "in" | "in-degree" => Ok(Self::In),
            "out" | "out-degree" => Ok(Self::Out),
            "total" | "total-degree" => Ok(Self::Total),
            other => Err(GenerationError::UnknownDegreeType {
                name: Arc::from(other),
            }),
        }
    }
}

/// Builds edges realising `degrees` over the given populations.
///
/// `degrees[i]` is the required degree of `source_ids[i]`. For
/// [`DegreeType::In`] each listed node receives that many edges from distinct
/// members of `target_ids`; for [`DegreeType::Out`] it emits them.
/// `existing_edges` counts toward those partner sets and is never duplicated
/// (only the new edges are returned).
///
/// Total-degree sequences, and every sequence on an undirected graph, need a
/// single population and are realised by stub matching.
///
/// # Errors
/// - [`GenerationError::DegreeSequenceLength`] when `degrees` and
///   `source_ids` differ in length.
/// - [`GenerationError::InsufficientPartners`] when a degree exceeds the
///   distinct partners left for its node.
/// - [`GenerationError::TooManyEdges`] when the sum exceeds the topology.
/// - [`GenerationError::SinglePopulationRequired`],
///   [`GenerationError::OddDegreeSum`] and [`GenerationError::NotGraphical`]
///   for infeasible total-degree sequences.
/// - [`GenerationError::ConvergenceFailure`] when stub matching runs out of
///   attempts.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{DegreeType, GraphOptions, from_degree_list, in_degrees};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let ids: Vec<usize> = (0..10).collect();
/// let edges = from_degree_list(
///     &mut rng,
///     &ids,
///     &ids,
///     &[3; 10],
///     DegreeType::In,
///     &[],
///     GraphOptions::default(),
/// )?;
/// assert_eq!(edges.len(), 30);
/// assert!(in_degrees(&edges, 10).iter().all(|&degree| degree == 3));
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.from_degree_list",
    err,
    skip(rng, source_ids, target_ids, degrees, existing_edges),
    fields(
        sources = source_ids.len(),
        targets = target_ids.len(),
        degree_type = %degree_type,
        directed = options.directed(),
    ),
)]
pub fn from_degree_list<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    degrees: &[usize],
    degree_type: DegreeType,
    existing_edges: &[Edge],
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    if degrees.len() != source_ids.len() {
        return Err(GenerationError::DegreeSequenceLength {
            expected: source_ids.len(),
            got: degrees.len(),
        });
    }
    let edges = if options.directed() && degree_type != DegreeType::Total {
        anchored_degrees(rng, source_ids, target_ids, degrees, degree_type, existing_edges, options)?
    } else {
        if !existing_edges.is_empty() {
            return Err(GenerationError::invalid(
                "existing_edges",
                "only supported for directed in- and out-degree sequences",
            ));
        }
        total_degrees(rng, source_ids, target_ids, degrees, options)?
    };
    info!(edges = edges.len(), "degree sequence realised");
    Ok(edges)
}

fn anchored_degrees<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    degrees: &[usize],
    degree_type: DegreeType,
    existing_edges: &[Edge],
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    let requested: usize = degrees.iter().sum();
    check_num_edges(source_ids, target_ids, requested, true, options.multigraph())?;

    let outgoing = degree_type == DegreeType::Out;
    let mut known: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in existing_edges {
        let (anchor, partner) = if outgoing {
            (edge.source(), edge.target())
        } else {
            (edge.target(), edge.source())
        };
        known.entry(anchor).or_default().push(partner);
    }

    let mut edges = Vec::with_capacity(requested);
    for (&anchor, &degree) in source_ids.iter().zip(degrees) {
        if degree == 0 {
            continue;
        }
        let pool: Vec<NodeId> = target_ids.iter().copied().filter(|&id| id != anchor).collect();
        let partners = if options.multigraph() {
            (0..degree)
                .filter_map(|_| pool.get(rng.gen_range(0..pool.len().max(1))).copied())
                .collect::<Vec<_>>()
        } else {
            let taken = known.get(&anchor).map_or(&[][..], Vec::as_slice);
            let free: Vec<NodeId> = pool.iter().copied().filter(|id| !taken.contains(id)).collect();
            if free.len() < degree {
                return Err(GenerationError::InsufficientPartners {
                    node: anchor,
                    degree,
                    available: free.len(),
                });
            }
            sampling::distinct_indices(rng, free.len(), degree)
                .into_iter()
                .map(|index| free[index])
                .collect()
        };
        if partners.len() < degree {
            return Err(GenerationError::InsufficientPartners {
                node: anchor,
                degree,
                available: pool.len(),
            });
        }
        edges.extend(partners.into_iter().map(|partner| {
            if outgoing {
                Edge::new(anchor, partner)
            } else {
                Edge::new(partner, anchor)
            }
        }));
    }
    Ok(edges)
}

/// Checks the Erdős–Gallai inequalities for a degree sequence.
///
/// # Errors
/// Returns [`GenerationError::NotGraphical`] with the first failing prefix
/// length of the descending sequence.
///
/// # Examples
/// ```
/// use synaptome_core::{GenerationError, check_graphical};
///
/// assert!(check_graphical(&[3, 3, 2, 2, 2]).is_ok());
/// assert_eq!(
///     check_graphical(&[5, 5, 5, 5, 1, 1]),
///     Err(GenerationError::NotGraphical { prefix: 2 })
/// );
/// ```
pub fn check_graphical(degrees: &[usize]) -> Result<()> {
    let mut sorted = degrees.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let mut prefix_sum = 0usize;
    for k in 1..=sorted.len() {
        prefix_sum += sorted[k - 1];
        let capped: usize = sorted[k..].iter().map(|&degree| degree.min(k)).sum();
        if prefix_sum > k * (k - 1) + capped {
            return Err(GenerationError::NotGraphical { prefix: k });
        }
    }
    Ok(())
}

/// A loop-free multigraph exists iff the largest degree does not exceed
/// the sum of all the others (the sum being even).
fn check_loopless_multigraph(degrees: &[usize]) -> Result<()> {
    let largest = degrees.iter().copied().max().unwrap_or(0);
    let rest = degrees.iter().sum::<usize>() - largest;
    if largest > rest {
        return Err(GenerationError::NotGraphical { prefix: 1 });
    }
    Ok(())
}

fn total_degrees<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    degrees: &[usize],
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    if !is_single_population(source_ids, target_ids) {
        return Err(GenerationError::SinglePopulationRequired {
            model: "total_degree",
        });
    }
    let nodes = source_ids.len();
    if !options.multigraph() {
        let available = nodes.saturating_sub(1);
        if let Some((index, &degree)) = degrees.iter().enumerate().find(|(_, degree)| **degree > available) {
            return Err(GenerationError::InsufficientPartners {
                node: source_ids[index],
                degree,
                available,
            });
        }
    }
    let sum: usize = degrees.iter().sum();
    if sum % 2 != 0 {
        return Err(GenerationError::OddDegreeSum { sum });
    }
    let target = sum / 2;
    check_num_edges(source_ids, target_ids, target, options.directed(), options.multigraph())?;
    if options.multigraph() {
        check_loopless_multigraph(degrees)?;
    } else {
        check_graphical(degrees)?;
    }

    let mut matcher = StubMatcher::new(degrees, options);
    let budget = options.retry_budget();
    let mut attempts = 0usize;
    while matcher.accepted() < target && attempts < budget.max_attempts() {
        matcher.match_round(rng, target);
        if matcher.accepted() < target && attempts >= budget.repair_threshold() {
            matcher.repair(rng)?;
        }
        attempts += 1;
    }
    if matcher.accepted() < target {
        return Err(GenerationError::ConvergenceFailure {
            model: MODEL,
            accepted: matcher.accepted(),
            target,
            attempts,
        });
    }
    Ok(matcher
        .into_edges()
        .into_iter()
        .map(|edge| Edge::new(source_ids[edge.source()], source_ids[edge.target()]))
        .collect())
}

/// Stub matching over local indices `0..n`.
struct StubMatcher {
    remaining: Vec<usize>,
    accumulator: EdgeAccumulator,
    directed: bool,
    multigraph: bool,
}

impl StubMatcher {
    fn new(degrees: &[usize], options: GraphOptions) -> Self {
        let policy = FilterPolicy::new(true, options.multigraph()).with_directed(options.directed());
        let capacity = degrees.iter().sum::<usize>() / 2;
        Self {
            remaining: degrees.to_vec(),
            accumulator: EdgeAccumulator::with_capacity(policy, capacity),
            directed: options.directed(),
            multigraph: options.multigraph(),
        }
    }

    fn accepted(&self) -> usize {
        self.accumulator.len()
    }

    fn stubs(&self) -> Vec<usize> {
        let indices: Vec<usize> = (0..self.remaining.len()).collect();
        sampling::repeat_by(&indices, &self.remaining)
    }

    fn match_round<R: Rng + ?Sized>(&mut self, rng: &mut R, target: usize) {
        telemetry::record_round(MODEL);
        let batch = ((target - self.accepted()) / 2).max(1);

        let stubs = self.stubs();
        let sources: Vec<usize> = sampling::distinct_indices(rng, stubs.len(), batch)
            .into_iter()
            .map(|index| stubs[index])
            .collect();
        let mut left = self.remaining.clone();
        for &source in &sources {
            left[source] -= 1;
        }
        let indices: Vec<usize> = (0..left.len()).collect();
        let partner_stubs = sampling::repeat_by(&indices, &left);
        let targets = sampling::distinct_indices(rng, partner_stubs.len(), sources.len())
            .into_iter()
            .map(|index| partner_stubs[index]);

        let mut added = 0usize;
        for edge in sources.iter().copied().zip(targets).map(Edge::from) {
            if self.remaining[edge.source()] == 0 || self.remaining[edge.target()] == 0 {
                continue;
            }
            if self.accumulator.insert(edge) {
                self.remaining[edge.source()] -= 1;
                self.remaining[edge.target()] -= 1;
                added += 1;
            }
        }
        debug!(added, accepted = self.accepted(), target, "stub matching round");
    }

    /// Re-pairs the endpoints of a few accepted edges with unfinished nodes.
    fn repair<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let mut unfinished: Vec<usize> = (0..self.remaining.len())
            .filter(|&node| self.remaining[node] > 0)
            .collect();
        if unfinished.is_empty() {
            return Ok(());
        }
        if unfinished.len() % 2 == 1 {
            let even: Vec<usize> = unfinished
                .iter()
                .copied()
                .filter(|&node| self.remaining[node] % 2 == 0)
                .collect();
            let Some(&extra) = even.choose(rng) else {
                return Ok(());
            };
            unfinished.push(extra);
        }
        let num_choice = (unfinished.len() / 2).max(1);
        if num_choice > self.accepted() {
            return Ok(());
        }

        let chosen = sampling::distinct_indices(rng, self.accepted(), num_choice);
        let endpoints: Vec<usize> = chosen
            .iter()
            .flat_map(|&index| {
                let edge = self.accumulator.edges()[index];
                [edge.source(), edge.target()]
            })
            .collect();
        unfinished.shuffle(rng);

        let mut proposal: Vec<Edge> = unfinished
            .iter()
            .copied()
            .zip(endpoints.iter().copied())
            .map(Edge::from)
            .collect();
        if self.directed {
            let flips = sampling::binomial(rng, proposal.len(), 0.5)?;
            for index in sampling::distinct_indices(rng, proposal.len(), flips) {
                proposal[index] = proposal[index].reversed();
            }
        }
        if !self.proposal_is_valid(&proposal) {
            return Ok(());
        }

        for edge in self.accumulator.remove_indices(&chosen) {
            self.remaining[edge.source()] += 1;
            self.remaining[edge.target()] += 1;
        }
        for edge in proposal {
            if self.accumulator.insert(edge) {
                self.remaining[edge.source()] = self.remaining[edge.source()].saturating_sub(1);
                self.remaining[edge.target()] = self.remaining[edge.target()].saturating_sub(1);
            }
        }
        telemetry::record_repair(MODEL);
        warn!(
            rewired = num_choice,
            accepted = self.accepted(),
            "degree repair step applied"
        );
        Ok(())
    }

    fn proposal_is_valid(&self, proposal: &[Edge]) -> bool {
        if self.multigraph {
            return proposal.iter().all(|edge| !edge.is_self_loop());
        }
        let policy = FilterPolicy::new(true, false).with_directed(self.directed);
        let mut batch = EdgeAccumulator::with_capacity(policy, proposal.len());
        proposal
            .iter()
            .all(|&edge| !edge.is_self_loop() && !self.accumulator.contains(edge) && batch.insert(edge))
    }

    fn into_edges(self) -> Vec<Edge> {
        self.accumulator.into_edges()
    }
}
