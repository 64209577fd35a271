//! Edge-count arithmetic shared by the density-driven generators.
//!
//! [`compute_connections`] turns a density, edge count or average degree into
//! a concrete edge target, shrinking it to a pre-reciprocal budget when a
//! reciprocity is requested. [`check_num_edges`] guards the target against
//! the capacity of the topology.

use std::collections::HashSet;

use crate::{
    edge::NodeId,
    error::{GenerationError, Result},
    params,
};

/// How many edges a generator should produce.
///
/// At least one field must be set. When several are set, `avg_deg` wins over
/// `edges`, which wins over `density`.
///
/// # Examples
/// ```
/// use synaptome_core::ConnectionSpec;
///
/// let spec = ConnectionSpec::from_density(0.1).with_avg_deg(5.0);
/// assert_eq!(spec.raw_edges(10, 10)?, 50);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConnectionSpec {
    density: Option<f64>,
    edges: Option<usize>,
    avg_deg: Option<f64>,
}

impl ConnectionSpec {
    /// Fraction of the `num_source * num_target` possible pairs.
    #[must_use]
    pub const fn from_density(density: f64) -> Self {
        Self {
            density: Some(density),
            edges: None,
            avg_deg: None,
        }
    }

    /// Absolute number of directed edges.
    #[must_use]
    pub const fn from_edges(edges: usize) -> Self {
        Self {
            density: None,
            edges: Some(edges),
            avg_deg: None,
        }
    }

    /// Mean number of edges per source node.
    #[must_use]
    pub const fn from_avg_deg(avg_deg: f64) -> Self {
        Self {
            density: None,
            edges: None,
            avg_deg: Some(avg_deg),
        }
    }

    /// Sets the density.
    #[must_use]
    pub const fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    /// Sets the absolute edge count.
    #[must_use]
    pub const fn with_edges(mut self, edges: usize) -> Self {
        self.edges = Some(edges);
        self
    }

    /// Sets the average degree.
    #[must_use]
    pub const fn with_avg_deg(mut self, avg_deg: f64) -> Self {
        self.avg_deg = Some(avg_deg);
        self
    }

    /// Returns the requested density, if any.
    #[must_use]
    #[rustfmt::skip]
    pub const fn density(&self) -> Option<f64> { self.density }

    /// Returns the requested edge count, if any.
    #[must_use]
    #[rustfmt::skip]
    pub const fn edges(&self) -> Option<usize> { self.edges }

    /// Returns the requested average degree, if any.
    #[must_use]
    #[rustfmt::skip]
    pub const fn avg_deg(&self) -> Option<f64> { self.avg_deg }

    /// Returns `true` when no field has been set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.density.is_none() && self.edges.is_none() && self.avg_deg.is_none()
    }

    /// Directed edge target before any reciprocity or undirected halving.
    ///
    /// # Errors
    /// Returns [`GenerationError::MissingEdgeTarget`] when no field is set and
    /// [`GenerationError::InvalidParameter`] for negative or non-finite values.
    pub fn raw_edges(&self, num_source: usize, num_target: usize) -> Result<usize> {
        if self.is_empty() {
            return Err(GenerationError::MissingEdgeTarget);
        }
        let avg_deg = self
            .avg_deg
            .map(|value| params::non_negative("avg_deg", value))
            .transpose()?;
        let density = self
            .density
            .map(|value| params::non_negative("density", value))
            .transpose()?;

        if let Some(avg) = avg_deg.filter(|avg| *avg > 0.0) {
            return Ok((avg * num_source as f64) as usize);
        }
        if let Some(edges) = self.edges.filter(|edges| *edges > 0) {
            return Ok(edges);
        }
        Ok(density.map_or(0, |density| {
            (density * num_source as f64 * num_target as f64) as usize
        }))
    }
}

/// Edge targets produced by [`compute_connections`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectionCounts {
    /// Final number of edges.
    pub edges: usize,
    /// Edges to draw before reciprocal copies are added.
    pub pre_reciprocal_edges: usize,
}

/// Converts a [`ConnectionSpec`] into concrete edge targets.
///
/// For undirected graphs both counts are half the raw target, each logical
/// edge being stored once. For directed graphs with `reciprocity` above the
/// density-imposed minimum `max(0, 2 - 1/density)`, the pre-reciprocal count
/// is shrunk so that reflecting random edges afterwards reaches the requested
/// reciprocity in expectation.
///
/// # Errors
/// - [`GenerationError::MissingEdgeTarget`] when `spec` is empty.
/// - [`GenerationError::InvalidParameter`] for a reciprocity outside `[0, 1]`.
/// - [`GenerationError::ReciprocityTooLow`] when a positive reciprocity is
///   below the minimum imposed by the density.
/// - [`GenerationError::ReciprocityUnreachable`] when the density leaves no
///   room for the requested reciprocity.
///
/// # Examples
/// ```
/// use synaptome_core::{ConnectionSpec, compute_connections};
///
/// let counts = compute_connections(10, 10, &ConnectionSpec::from_edges(31), false, None)?;
/// assert_eq!(counts.edges, 15);
/// assert_eq!(counts.pre_reciprocal_edges, 15);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn compute_connections(
    num_source: usize,
    num_target: usize,
    spec: &ConnectionSpec,
    directed: bool,
    reciprocity: Option<f64>,
) -> Result<ConnectionCounts> {
    let raw = spec.raw_edges(num_source, num_target)?;
    if !directed {
        let halved = raw / 2;
        return Ok(ConnectionCounts {
            edges: halved,
            pre_reciprocal_edges: halved,
        });
    }

    let reciprocity = reciprocity
        .map(|value| params::probability("reciprocity", value))
        .transpose()?
        .unwrap_or(0.0);
    let pairs = num_source * num_target;
    if reciprocity <= 0.0 || raw == 0 || pairs == 0 {
        return Ok(ConnectionCounts {
            edges: raw,
            pre_reciprocal_edges: raw,
        });
    }

    let density = raw as f64 / pairs as f64;
    let minimum = (2.0 - density.recip()).max(0.0);
    if reciprocity <= minimum {
        return Err(GenerationError::ReciprocityTooLow {
            requested: reciprocity,
            minimum,
        });
    }
    let reflected_fraction = (reciprocity - 1.0 + (1.0 + density * (reciprocity - 2.0)).sqrt())
        / (2.0 - reciprocity);
    if reflected_fraction >= 1.0 {
        return Err(GenerationError::ReciprocityUnreachable {
            requested: reciprocity,
        });
    }
    Ok(ConnectionCounts {
        edges: raw,
        pre_reciprocal_edges: (raw as f64 / (1.0 + reflected_fraction)) as usize,
    })
}

/// Returns `true` when both id slices describe the same node set.
///
/// # Examples
/// ```
/// use synaptome_core::is_single_population;
///
/// assert!(is_single_population(&[2, 0, 1], &[0, 1, 2]));
/// assert!(is_single_population(&[0, 1, 1], &[1, 0]));
/// assert!(!is_single_population(&[0, 1], &[2, 3]));
/// ```
#[must_use]
pub fn is_single_population(source_ids: &[NodeId], target_ids: &[NodeId]) -> bool {
    let sources: HashSet<NodeId> = source_ids.iter().copied().collect();
    let targets: HashSet<NodeId> = target_ids.iter().copied().collect();
    sources == targets
}

/// Maximum number of simple edges between the two id sets.
#[must_use]
pub fn edge_capacity(num_source: usize, num_target: usize, single_population: bool, directed: bool) -> usize {
    let capacity = if single_population {
        num_source * num_target.saturating_sub(1)
    } else {
        num_source * num_target
    };
    if directed { capacity } else { capacity / 2 }
}

/// Checks that `num_edges` fits in the topology and reports whether the call
/// is single-population.
///
/// Multigraphs have no ceiling.
///
/// # Errors
/// Returns [`GenerationError::TooManyEdges`] when the request exceeds the
/// capacity of a simple graph.
///
/// # Examples
/// ```
/// use synaptome_core::{GenerationError, check_num_edges};
///
/// let ids = [0, 1, 2];
/// assert!(check_num_edges(&ids, &ids, 6, true, false)?);
/// assert!(matches!(
///     check_num_edges(&ids, &ids, 4, false, false),
///     Err(GenerationError::TooManyEdges { requested: 4, capacity: 3 })
/// ));
/// # Ok::<(), GenerationError>(())
/// ```
pub fn check_num_edges(
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    num_edges: usize,
    directed: bool,
    multigraph: bool,
) -> Result<bool> {
    let single_population = is_single_population(source_ids, target_ids);
    if !multigraph {
        let capacity = edge_capacity(source_ids.len(), target_ids.len(), single_population, directed);
        if num_edges > capacity {
            return Err(GenerationError::TooManyEdges {
                requested: num_edges,
                capacity,
            });
        }
    }
    Ok(single_population)
}
