//! Ring lattices and the Newman–Watts small-world model.

use std::{fmt, str::FromStr, sync::Arc};

use rand::Rng;
use tracing::{debug, info, instrument};

use crate::{
    arithmetic::{check_num_edges, is_single_population},
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    filter::{EdgeAccumulator, FilterPolicy},
    params::{self, GraphOptions},
    sampling, telemetry,
};

/// How reciprocal copies are picked in a directed ring.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ReciprocityChoice {
    /// Uniformly among all lattice edges.
    #[default]
    Random,
    /// Closest lattice neighbours first, with the last partial round drawn at
    /// random.
    Closest,
    /// Closest lattice neighbours first, without any random draw.
    ClosestOrdered,
}

impl ReciprocityChoice {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Closest => "closest",
            Self::ClosestOrdered => "closest-ordered",
        }
    }
}

impl fmt::Display for ReciprocityChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReciprocityChoice {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "random" => Ok(Self::Random),
            "closest" => Ok(Self::Closest),
            "closest-ordered" => Ok(Self::ClosestOrdered),
            other => Err(GenerationError::UnknownReciprocityChoice {
                name: Arc::from(other),
            }),
        }
    }
}

fn validate_coord_nb(coord_nb: usize, nodes: usize) -> Result<()> {
    if coord_nb % 2 != 0 {
        return Err(GenerationError::invalid("coord_nb", format!("{coord_nb} must be even")));
    }
    if nodes > 0 && coord_nb >= nodes {
        return Err(GenerationError::invalid(
            "coord_nb",
            format!("{coord_nb} neighbours do not fit on a ring of {nodes} nodes"),
        ));
    }
    Ok(())
}

/// Connects every node to its `coord_nb` nearest ring neighbours.
///
/// Directed rings hold one edge per (node, neighbour) pair, undirected rings
/// one edge per neighbouring pair. Edges are emitted offset by offset; for
/// undirected rings the nearest neighbours come first.
///
/// # Errors
/// Returns [`GenerationError::InvalidParameter`] when `coord_nb` is odd or
/// not smaller than the number of nodes.
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, circular_full};
///
/// let edges = circular_full(&[10, 11, 12, 13], 2, false)?;
/// assert_eq!(edges[0], Edge::new(10, 11));
/// assert_eq!(edges[3], Edge::new(13, 10));
/// assert_eq!(circular_full(&[0, 1, 2, 3], 2, true)?.len(), 8);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn circular_full(node_ids: &[NodeId], coord_nb: usize, directed: bool) -> Result<Vec<Edge>> {
    let nodes = node_ids.len();
    validate_coord_nb(coord_nb, nodes)?;
    let dist = coord_nb / 2;
    let offsets: Vec<isize> = if directed {
        (1..=dist as isize).map(|offset| -offset).rev().chain(1..=dist as isize).collect()
    } else {
        (1..=dist as isize).collect()
    };
    let ring = nodes as isize;
    let mut edges = Vec::with_capacity(offsets.len() * nodes);
    for offset in offsets {
        for (position, &source) in node_ids.iter().enumerate() {
            let target = (position as isize + offset).rem_euclid(ring) as usize;
            edges.push(Edge::new(source, node_ids[target]));
        }
    }
    Ok(edges)
}

/// Ring lattice with a controllable fraction of reciprocal edges.
///
/// With `reciprocity == 1` or an undirected graph this is
/// [`circular_full`]. Otherwise the undirected ring is built, a
/// `Binomial(E, 0.5)` subset of its edges is reversed, and
/// `0.5 · n · coord_nb · reciprocity` reversed copies are appended, picked
/// according to `choice`.
///
/// # Errors
/// Returns [`GenerationError::InvalidParameter`] for an invalid `coord_nb` or
/// a reciprocity outside `[0, 1]`.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{ReciprocityChoice, circular};
///
/// let ids: Vec<usize> = (0..20).collect();
/// let mut rng = SmallRng::seed_from_u64(2);
/// let edges = circular(&mut rng, &ids, 4, 0.5, true, ReciprocityChoice::Random)?;
/// assert_eq!(edges.len(), 60);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn circular<R: Rng + ?Sized>(
    rng: &mut R,
    node_ids: &[NodeId],
    coord_nb: usize,
    reciprocity: f64,
    directed: bool,
    choice: ReciprocityChoice,
) -> Result<Vec<Edge>> {
    let reciprocity = params::probability("reciprocity", reciprocity)?;
    if !directed || reciprocity >= 1.0 {
        return circular_full(node_ids, coord_nb, directed);
    }

    let nodes = node_ids.len();
    let mut edges = circular_full(node_ids, coord_nb, false)?;
    let num_init = edges.len();
    let total = (0.5 * nodes as f64 * coord_nb as f64 * (1.0 + reciprocity)) as usize;

    let flips = sampling::binomial(rng, num_init, 0.5)?;
    for index in sampling::distinct_indices(rng, num_init, flips) {
        edges[index] = edges[index].reversed();
    }

    let num_recip = total.saturating_sub(num_init).min(num_init);
    let reciprocated: Vec<usize> = match choice {
        ReciprocityChoice::Random => sampling::distinct_indices(rng, num_init, num_recip),
        ReciprocityChoice::Closest => {
            let remainder = num_recip % nodes.max(1);
            let rounds = num_recip - remainder;
            let stop = (rounds + nodes).min(num_init);
            let mut picked: Vec<usize> = (0..rounds).collect();
            picked.extend(
                sampling::distinct_indices(rng, stop - rounds, remainder)
                    .into_iter()
                    .map(|offset| rounds + offset),
            );
            picked
        }
        ReciprocityChoice::ClosestOrdered => (0..num_recip).collect(),
    };
    let copies: Vec<Edge> = reciprocated.into_iter().map(|index| edges[index].reversed()).collect();
    edges.extend(copies);
    Ok(edges)
}

/// Parameters of the Newman–Watts small-world model.
///
/// # Examples
/// ```
/// use synaptome_core::NewmanWattsParams;
///
/// let params = NewmanWattsParams::new(4, 0.1)?.with_edges(120);
/// assert_eq!(params.coord_nb(), 4);
/// assert_eq!(params.edges(), Some(120));
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewmanWattsParams {
    coord_nb: usize,
    proba_shortcut: f64,
    reciprocity_circular: f64,
    reciprocity_choice: ReciprocityChoice,
    edges: Option<usize>,
}

impl NewmanWattsParams {
    /// Ring of `coord_nb` neighbours plus shortcuts drawn with
    /// `proba_shortcut` per lattice edge.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when `proba_shortcut` is
    /// not a probability.
    pub fn new(coord_nb: usize, proba_shortcut: f64) -> Result<Self> {
        Ok(Self {
            coord_nb,
            proba_shortcut: params::probability("proba_shortcut", proba_shortcut)?,
            reciprocity_circular: 1.0,
            reciprocity_choice: ReciprocityChoice::Random,
            edges: None,
        })
    }

    /// Reciprocity of the underlying ring (directed graphs only).
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] outside `[0, 1]`.
    pub fn with_reciprocity_circular(mut self, reciprocity: f64) -> Result<Self> {
        self.reciprocity_circular = params::probability("reciprocity_circular", reciprocity)?;
        Ok(self)
    }

    /// How reciprocal ring edges are picked.
    #[must_use]
    pub const fn with_reciprocity_choice(mut self, choice: ReciprocityChoice) -> Self {
        self.reciprocity_choice = choice;
        self
    }

    /// Fixes the total edge count instead of drawing the shortcut count.
    #[must_use]
    pub const fn with_edges(mut self, edges: usize) -> Self {
        self.edges = Some(edges);
        self
    }

    /// Returns the coordination number.
    #[must_use]
    #[rustfmt::skip]
    pub const fn coord_nb(&self) -> usize { self.coord_nb }

    /// Returns the shortcut probability.
    #[must_use]
    #[rustfmt::skip]
    pub const fn proba_shortcut(&self) -> f64 { self.proba_shortcut }

    /// Returns the reciprocity of the underlying ring.
    #[must_use]
    #[rustfmt::skip]
    pub const fn reciprocity_circular(&self) -> f64 { self.reciprocity_circular }

    /// Returns the explicit edge count, if any.
    #[must_use]
    #[rustfmt::skip]
    pub const fn edges(&self) -> Option<usize> { self.edges }
}

/// Newman–Watts small world: a ring lattice plus random shortcuts.
///
/// # Errors
/// - [`GenerationError::SinglePopulationRequired`] for two populations.
/// - Ring parameter failures from [`circular`].
/// - [`GenerationError::TooManyEdges`] when the total exceeds the capacity.
/// - [`GenerationError::ConvergenceFailure`] when shortcuts cannot be placed
///   within the retry budget.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{GraphOptions, NewmanWattsParams, circular_full, generate_newman_watts};
///
/// let ids: Vec<usize> = (0..12).collect();
/// let mut rng = SmallRng::seed_from_u64(8);
/// let params = NewmanWattsParams::new(4, 0.0)?;
/// let edges = generate_newman_watts(&mut rng, &ids, &ids, &params, GraphOptions::default())?;
/// assert_eq!(edges, circular_full(&ids, 4, true)?);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.newman_watts",
    err,
    skip(rng, source_ids, target_ids, params),
    fields(
        nodes = source_ids.len(),
        coord_nb = params.coord_nb,
        proba_shortcut = params.proba_shortcut,
        directed = options.directed(),
    ),
)]
pub fn generate_newman_watts<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &NewmanWattsParams,
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    const MODEL: &str = "newman_watts";
    if !is_single_population(source_ids, target_ids) {
        return Err(GenerationError::SinglePopulationRequired { model: MODEL });
    }
    if source_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ring = circular(
        rng,
        source_ids,
        params.coord_nb,
        params.reciprocity_circular,
        options.directed(),
        params.reciprocity_choice,
    )?;
    let lattice_edges = ring.len();
    let target = match params.edges {
        Some(edges) => edges,
        None => lattice_edges + sampling::binomial(rng, lattice_edges, params.proba_shortcut)?,
    };
    if target < lattice_edges {
        return Err(GenerationError::invalid(
            "edges",
            format!("{target} is fewer than the {lattice_edges} lattice edges"),
        ));
    }
    check_num_edges(source_ids, target_ids, target, options.directed(), options.multigraph())?;

    let policy = FilterPolicy::new(true, options.multigraph()).with_directed(options.directed());
    let mut accumulator = EdgeAccumulator::from_accepted(policy, ring);
    let mut attempts = 0usize;
    while accumulator.len() < target && attempts < options.retry_budget().max_attempts() {
        telemetry::record_round(MODEL);
        let todo = target - accumulator.len();
        let shortcuts: Vec<Edge> = (0..todo)
            .map(|_| {
                let source = source_ids[rng.gen_range(0..source_ids.len())];
                let target = source_ids[rng.gen_range(0..source_ids.len())];
                Edge::new(source, target)
            })
            .collect();
        let added = accumulator.extend(shortcuts);
        debug!(added, accepted = accumulator.len(), target, "shortcut round");
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

    let edges = accumulator.into_edges();
    info!(edges = edges.len(), shortcuts = edges.len() - lattice_edges, "newman-watts graph generated");
    Ok(edges)
}
