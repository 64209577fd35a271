//! Degree-distribution wrappers around [`from_degree_list`].

use rand::{Rng, seq::IteratorRandom};
use rand_distr::{Distribution, Normal};
use tracing::instrument;

use crate::{
    degree::{DegreeType, from_degree_list},
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    params::{self, GraphOptions},
};

/// Parameters of the fixed-degree model.
///
/// # Examples
/// ```
/// use synaptome_core::{DegreeType, FixedDegreeParams};
///
/// let params = FixedDegreeParams::new(4).with_degree_type(DegreeType::Out);
/// assert_eq!(params.degree(), 4);
/// assert_eq!(params.degree_type(), DegreeType::Out);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedDegreeParams {
    degree: usize,
    degree_type: DegreeType,
    existing_edges: Vec<Edge>,
}

impl FixedDegreeParams {
    /// Every anchor node gets exactly `degree` edges.
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            ..Self::default()
        }
    }

    /// Chooses which degree is fixed.
    #[must_use]
    pub fn with_degree_type(mut self, degree_type: DegreeType) -> Self {
        self.degree_type = degree_type;
        self
    }

    /// Edges already present that count toward in/out degrees.
    #[must_use]
    pub fn with_existing_edges(mut self, existing_edges: Vec<Edge>) -> Self {
        self.existing_edges = existing_edges;
        self
    }

    /// Returns the fixed degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the constrained degree type.
    #[must_use]
    pub fn degree_type(&self) -> DegreeType {
        self.degree_type
    }

    /// Returns the pre-existing edges.
    #[must_use]
    pub fn existing_edges(&self) -> &[Edge] {
        &self.existing_edges
    }
}

/// Connects every anchor node with the same degree.
///
/// # Errors
/// Propagates every failure of [`from_degree_list`].
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{FixedDegreeParams, GraphOptions, generate_fixed_degree};
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// let ids: Vec<usize> = (0..8).collect();
/// let edges = generate_fixed_degree(&mut rng, &ids, &ids, &FixedDegreeParams::new(2), GraphOptions::default())?;
/// assert_eq!(edges.len(), 16);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.fixed_degree",
    err,
    skip(rng, source_ids, target_ids, params),
    fields(sources = source_ids.len(), degree = params.degree, degree_type = %params.degree_type),
)]
pub fn generate_fixed_degree<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &FixedDegreeParams,
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    let degrees = vec![params.degree; source_ids.len()];
    from_degree_list(
        rng,
        source_ids,
        target_ids,
        &degrees,
        params.degree_type,
        &params.existing_edges,
        options,
    )
}

/// Parameters of the Gaussian-degree model.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianDegreeParams {
    avg: f64,
    std: f64,
    degree_type: DegreeType,
    existing_edges: Vec<Edge>,
}

impl GaussianDegreeParams {
    /// Degrees are drawn from `Normal(avg, std)`, clipped at zero and rounded.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when either value is
    /// negative or not finite.
    pub fn new(avg: f64, std: f64) -> Result<Self> {
        Ok(Self {
            avg: params::non_negative("avg", avg)?,
            std: params::non_negative("std", std)?,
            degree_type: DegreeType::default(),
            existing_edges: Vec::new(),
        })
    }

    /// Chooses which degree is drawn.
    #[must_use]
    pub fn with_degree_type(mut self, degree_type: DegreeType) -> Self {
        self.degree_type = degree_type;
        self
    }

    /// Edges already present that count toward in/out degrees.
    #[must_use]
    pub fn with_existing_edges(mut self, existing_edges: Vec<Edge>) -> Self {
        self.existing_edges = existing_edges;
        self
    }

    /// Returns the mean degree.
    #[must_use]
    pub fn avg(&self) -> f64 {
        self.avg
    }

    /// Returns the standard deviation.
    #[must_use]
    pub fn std(&self) -> f64 {
        self.std
    }

    /// Returns the constrained degree type.
    #[must_use]
    pub fn degree_type(&self) -> DegreeType {
        self.degree_type
    }
}

/// Samples `count` degrees from `Normal(avg, std)`, clipped at zero and
/// rounded.
///
/// With `even_sum`, an odd total is fixed by decrementing one randomly chosen
/// positive entry.
///
/// # Errors
/// Returns [`GenerationError::InvalidParameter`] when the distribution cannot
/// be built.
pub fn gaussian_degree_sequence<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    avg: f64,
    std: f64,
    even_sum: bool,
) -> Result<Vec<usize>> {
    let normal =
        Normal::new(avg, std).map_err(|error| GenerationError::invalid("std", error.to_string()))?;
    let mut degrees: Vec<usize> = (0..count)
        .map(|_| normal.sample(rng).max(0.0).round() as usize)
        .collect();
    if even_sum && degrees.iter().sum::<usize>() % 2 != 0 {
        let positive = degrees
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(index, _)| index)
            .choose(rng);
        if let Some(index) = positive {
            degrees[index] -= 1;
        }
    }
    Ok(degrees)
}

/// Connects anchor nodes with Gaussian-distributed degrees.
///
/// # Errors
/// Propagates every failure of [`from_degree_list`].
#[instrument(
    name = "generation.gaussian_degree",
    err,
    skip(rng, source_ids, target_ids, params),
    fields(sources = source_ids.len(), avg = params.avg, std = params.std, degree_type = %params.degree_type),
)]
pub fn generate_gaussian_degree<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    params: &GaussianDegreeParams,
    options: GraphOptions,
) -> Result<Vec<Edge>> {
    let even_sum = params.degree_type == DegreeType::Total || !options.directed();
    let degrees = gaussian_degree_sequence(rng, source_ids.len(), params.avg, params.std, even_sum)?;
    from_degree_list(
        rng,
        source_ids,
        target_ids,
        &degrees,
        params.degree_type,
        &params.existing_edges,
        options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{
        GenerationErrorCode, in_degrees, out_degrees,
        test_utils::{node_range, seeded_rng},
    };

    #[rstest]
    fn fixed_in_degree_on_fifty_nodes_yields_two_hundred_edges() {
        let ids = node_range(50);
        let mut rng = seeded_rng(2024);
        let edges = generate_fixed_degree(
            &mut rng,
            &ids,
            &ids,
            &FixedDegreeParams::new(4),
            GraphOptions::default(),
        )
        .expect("feasible");
        assert_eq!(edges.len(), 200);
        assert_eq!(in_degrees(&edges, 50), vec![4; 50]);
    }

    #[rstest]
    fn fixed_out_degree_sets_out_degrees() {
        let ids = node_range(12);
        let mut rng = seeded_rng(5);
        let params = FixedDegreeParams::new(3).with_degree_type(DegreeType::Out);
        let edges = generate_fixed_degree(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect("feasible");
        assert_eq!(out_degrees(&edges, 12), vec![3; 12]);
    }

    #[rstest]
    #[case::in_degree(DegreeType::In)]
    #[case::out_degree(DegreeType::Out)]
    fn multigraph_degree_may_exceed_node_count(#[case] degree_type: DegreeType) {
        let ids = node_range(5);
        let params = FixedDegreeParams::new(8).with_degree_type(degree_type);
        let mut rng = seeded_rng(14);
        let edges = generate_fixed_degree(&mut rng, &ids, &ids, &params, GraphOptions::default().with_multigraph(true))
            .expect("repeated partners are allowed");
        assert_eq!(edges.len(), 40);
        assert!(edges.iter().all(|edge| !edge.is_self_loop()));
        let degrees = match degree_type {
            DegreeType::Out => out_degrees(&edges, 5),
            _ => in_degrees(&edges, 5),
        };
        assert_eq!(degrees, vec![8; 5]);

        let err = generate_fixed_degree(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect_err("four partners per node in a simple graph");
        assert_eq!(err.code(), GenerationErrorCode::TooManyEdges);
    }

    #[rstest]
    fn simple_degree_above_partner_pool_is_rejected() {
        let sources = [0, 1];
        let targets = [0, 1, 2];
        let params = FixedDegreeParams::new(3).with_degree_type(DegreeType::Out);
        let mut rng = seeded_rng(3);
        let err = generate_fixed_degree(&mut rng, &sources, &targets, &params, GraphOptions::default())
            .expect_err("each source has two partners");
        assert_eq!(err.code(), GenerationErrorCode::InsufficientPartners);

        let edges = generate_fixed_degree(&mut rng, &sources, &targets, &params, GraphOptions::default().with_multigraph(true))
            .expect("multigraph repeats partners");
        assert_eq!(out_degrees(&edges, 3)[..2], [3, 3]);
    }

    #[rstest]
    fn zero_degree_yields_no_edges() {
        let ids = node_range(5);
        let mut rng = seeded_rng(5);
        let edges = generate_fixed_degree(&mut rng, &ids, &ids, &FixedDegreeParams::new(0), GraphOptions::default())
            .expect("no-op");
        assert!(edges.is_empty());
    }

    #[rstest]
    #[case(-1.0, 1.0)]
    #[case(1.0, -0.5)]
    #[case(f64::NAN, 1.0)]
    fn gaussian_params_reject_negative_values(#[case] avg: f64, #[case] std: f64) {
        let err = GaussianDegreeParams::new(avg, std).expect_err("invalid");
        assert_eq!(err.code(), GenerationErrorCode::InvalidParameter);
    }

    #[rstest]
    #[case::seed_1(1)]
    #[case::seed_2(2)]
    #[case::seed_3(3)]
    #[case::seed_4(4)]
    fn gaussian_sequence_parity_is_corrected(#[case] seed: u64) {
        let mut rng = seeded_rng(seed);
        let degrees = gaussian_degree_sequence(&mut rng, 31, 5.0, 2.0, true).expect("valid");
        assert_eq!(degrees.len(), 31);
        assert_eq!(degrees.iter().sum::<usize>() % 2, 0);
    }

    #[rstest]
    fn zero_deviation_gives_constant_sequence() {
        let mut rng = seeded_rng(9);
        let degrees = gaussian_degree_sequence(&mut rng, 10, 3.0, 0.0, false).expect("valid");
        assert_eq!(degrees, vec![3; 10]);
    }

    #[rstest]
    fn gaussian_in_degree_generation_matches_sampled_sum() {
        let ids = node_range(40);
        let mut rng = seeded_rng(77);
        let params = GaussianDegreeParams::new(5.0, 1.0).expect("valid");
        let edges = generate_gaussian_degree(&mut rng, &ids, &ids, &params, GraphOptions::default())
            .expect("feasible");
        let mean = edges.len() as f64 / 40.0;
        assert!((3.5..=6.5).contains(&mean), "mean in-degree {mean}");
    }
}
