//! Model selection for whole-graph and group-to-group generation.
//!
//! A [`GraphModel`] pairs a generator with its parameter record. The same
//! value drives [`connect_groups`], which only produces edges between two id
//! sets, and [`generate`]/[`generate_into`], which also handle node creation,
//! placement and labelling of a [`GraphContainer`].

use std::{borrow::Cow, fmt, str::FromStr, sync::Arc};

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    all_to_all::{AllToAllParams, generate_all_to_all},
    distribution::{FixedDegreeParams, GaussianDegreeParams, generate_fixed_degree, generate_gaussian_degree},
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    graph::{Graph, GraphContainer},
    lattice::{NewmanWattsParams, generate_newman_watts},
    params::GraphOptions,
    random::{ErdosRenyiParams, RandomScaleFreeParams, generate_erdos_renyi, generate_random_scale_free},
    shape::{DEFAULT_NEURON_DENSITY, Rectangle, Shape, uniform_positions},
    spatial::{DistanceRuleParams, Positions, edge_distances, generate_distance_rule},
};

/// Names of the registered generators.
///
/// # Examples
/// ```
/// use synaptome_core::ModelKind;
///
/// let kind: ModelKind = "newman_watts".parse()?;
/// assert_eq!(kind, ModelKind::NewmanWatts);
/// assert!("watts_strogatz".parse::<ModelKind>().is_err());
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ModelKind {
    /// Every source connected to every target.
    AllToAll,
    /// Uniform random edges.
    ErdosRenyi,
    /// Power-law in- and out-degrees.
    RandomScaleFree,
    /// Preferential attachment, served by an external backend.
    PriceScaleFree,
    /// Ring lattice plus random shortcuts.
    NewmanWatts,
    /// Identical degree for every node.
    FixedDegree,
    /// Normally distributed degrees.
    GaussianDegree,
    /// Distance-dependent connection probability.
    DistanceRule,
}

impl ModelKind {
    /// Every registered model.
    pub const ALL: [Self; 8] = [
        Self::AllToAll,
        Self::ErdosRenyi,
        Self::RandomScaleFree,
        Self::PriceScaleFree,
        Self::NewmanWatts,
        Self::FixedDegree,
        Self::GaussianDegree,
        Self::DistanceRule,
    ];

    /// Returns the registered model name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllToAll => "all_to_all",
            Self::ErdosRenyi => "erdos_renyi",
            Self::RandomScaleFree => "random_scale_free",
            Self::PriceScaleFree => "price_scale_free",
            Self::NewmanWatts => "newman_watts",
            Self::FixedDegree => "fixed_degree",
            Self::GaussianDegree => "gaussian_degree",
            Self::DistanceRule => "distance_rule",
        }
    }

    /// Name given to graphs built by [`generate`].
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::AllToAll => "AllToAll",
            Self::ErdosRenyi => "ER",
            Self::RandomScaleFree => "RandomSF",
            Self::PriceScaleFree => "PriceSF",
            Self::NewmanWatts => "NW",
            Self::FixedDegree => "FD",
            Self::GaussianDegree => "GD",
            Self::DistanceRule => "DR",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| GenerationError::UnknownModel {
                name: Arc::from(value),
            })
    }
}

/// A generator together with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphModel {
    /// See [`generate_all_to_all`].
    AllToAll(AllToAllParams),
    /// See [`generate_erdos_renyi`].
    ErdosRenyi(ErdosRenyiParams),
    /// See [`generate_random_scale_free`].
    RandomScaleFree(RandomScaleFreeParams),
    /// Recognised but not generated natively.
    PriceScaleFree,
    /// See [`generate_newman_watts`].
    NewmanWatts(NewmanWattsParams),
    /// See [`generate_fixed_degree`].
    FixedDegree(FixedDegreeParams),
    /// See [`generate_gaussian_degree`].
    GaussianDegree(GaussianDegreeParams),
    /// See [`generate_distance_rule`].
    DistanceRule(DistanceRuleParams),
}

impl GraphModel {
    /// Returns the model name.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::AllToAll(_) => ModelKind::AllToAll,
            Self::ErdosRenyi(_) => ModelKind::ErdosRenyi,
            Self::RandomScaleFree(_) => ModelKind::RandomScaleFree,
            Self::PriceScaleFree => ModelKind::PriceScaleFree,
            Self::NewmanWatts(_) => ModelKind::NewmanWatts,
            Self::FixedDegree(_) => ModelKind::FixedDegree,
            Self::GaussianDegree(_) => ModelKind::GaussianDegree,
            Self::DistanceRule(_) => ModelKind::DistanceRule,
        }
    }

    /// Label stored on containers filled by this model.
    ///
    /// # Examples
    /// ```
    /// use synaptome_core::{DegreeType, FixedDegreeParams, GraphModel};
    ///
    /// let model = GraphModel::FixedDegree(FixedDegreeParams::new(3).with_degree_type(DegreeType::Out));
    /// assert_eq!(model.graph_type(), "fixed_out_degree");
    /// ```
    #[must_use]
    pub fn graph_type(&self) -> Cow<'static, str> {
        match self {
            Self::FixedDegree(params) => Cow::Owned(format!("fixed_{}_degree", params.degree_type())),
            Self::GaussianDegree(params) => Cow::Owned(format!("gaussian_{}_degree", params.degree_type())),
            Self::DistanceRule(params) => Cow::Owned(format!("{}_distance_rule", params.rule())),
            other => Cow::Borrowed(other.kind().as_str()),
        }
    }

    /// Returns `true` for models that read node positions.
    #[must_use]
    pub const fn uses_positions(&self) -> bool {
        match self {
            Self::DistanceRule(_) => true,
            Self::AllToAll(params) => params.distances(),
            _ => false,
        }
    }
}

/// Edges returned by [`connect_groups`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedEdges {
    /// Accepted edges.
    pub edges: Vec<Edge>,
    /// Edge lengths, for models that compute them.
    pub distances: Option<Vec<f64>>,
}

impl From<Vec<Edge>> for GeneratedEdges {
    fn from(edges: Vec<Edge>) -> Self {
        Self {
            edges,
            distances: None,
        }
    }
}

/// Runs the edge-level algorithm of `model` between two id sets.
///
/// # Errors
/// - [`GenerationError::BackendUnavailable`] for `price_scale_free`.
/// - [`GenerationError::MissingPositions`] when the model needs positions and
///   none are supplied.
/// - Any error of the selected generator.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{ConnectionSpec, ErdosRenyiParams, GraphModel, GraphOptions, connect_groups};
///
/// let model = GraphModel::ErdosRenyi(ErdosRenyiParams::new(ConnectionSpec::from_edges(6)));
/// let mut rng = SmallRng::seed_from_u64(2);
/// let out = connect_groups(&mut rng, &[0, 1, 2], &[3, 4, 5], &model, GraphOptions::default(), None)?;
/// assert_eq!(out.edges.len(), 6);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[instrument(
    name = "generation.connect_groups",
    err,
    skip(rng, source_ids, target_ids, model, positions),
    fields(model = %model.kind(), sources = source_ids.len(), targets = target_ids.len()),
)]
pub fn connect_groups<R: Rng + ?Sized>(
    rng: &mut R,
    source_ids: &[NodeId],
    target_ids: &[NodeId],
    model: &GraphModel,
    options: GraphOptions,
    positions: Option<&Positions>,
) -> Result<GeneratedEdges> {
    let out = match model {
        GraphModel::AllToAll(params) => {
            let edges = generate_all_to_all(source_ids, target_ids, options);
            let distances = match (params.distances(), positions) {
                (false, _) => None,
                (true, Some(positions)) => Some(edge_distances(positions, &edges)?),
                (true, None) => return Err(GenerationError::MissingPositions { model: "all_to_all" }),
            };
            GeneratedEdges { edges, distances }
        }
        GraphModel::ErdosRenyi(params) => generate_erdos_renyi(rng, source_ids, target_ids, params, options)?.into(),
        GraphModel::RandomScaleFree(params) => {
            generate_random_scale_free(rng, source_ids, target_ids, params, options)?.into()
        }
        GraphModel::PriceScaleFree => {
            return Err(GenerationError::BackendUnavailable {
                model: ModelKind::PriceScaleFree.as_str(),
            });
        }
        GraphModel::NewmanWatts(params) => generate_newman_watts(rng, source_ids, target_ids, params, options)?.into(),
        GraphModel::FixedDegree(params) => generate_fixed_degree(rng, source_ids, target_ids, params, options)?.into(),
        GraphModel::GaussianDegree(params) => {
            generate_gaussian_degree(rng, source_ids, target_ids, params, options)?.into()
        }
        GraphModel::DistanceRule(params) => {
            let positions = positions.ok_or(GenerationError::MissingPositions {
                model: ModelKind::DistanceRule.as_str(),
            })?;
            let spatial = generate_distance_rule(rng, source_ids, target_ids, params, positions, options)?;
            GeneratedEdges {
                edges: spatial.edges,
                distances: Some(spatial.distances),
            }
        }
    };
    Ok(out)
}

/// Where nodes are placed for models that read positions.
#[derive(Default)]
pub enum Placement {
    /// Square sized for the given node density, unless the container already
    /// holds positions.
    #[default]
    Default,
    /// Square sized for the given node density (nodes per unit area).
    Density(f64),
    /// Uniform sampling inside a shape.
    Shape(Box<dyn Shape + Send + Sync>),
    /// Fixed coordinates, one row per node.
    Positions(Positions),
}

impl fmt::Debug for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Density(density) => f.debug_tuple("Density").field(density).finish(),
            Self::Shape(shape) => f.debug_tuple("Shape").field(&shape.bounds()).finish(),
            Self::Positions(positions) => f.debug_tuple("Positions").field(&positions.len()).finish(),
        }
    }
}

fn place<R, G>(rng: &mut R, graph: &G, placement: Placement, options: GraphOptions) -> Result<Option<Positions>>
where
    R: Rng + ?Sized,
    G: GraphContainer + ?Sized,
{
    let nodes = graph.node_nb();
    let density = match placement {
        Placement::Positions(positions) => return Ok(Some(positions)),
        Placement::Shape(shape) => {
            return uniform_positions(rng, shape.as_ref(), nodes, options.retry_budget()).map(Some);
        }
        Placement::Default if graph.positions().is_some() => return Ok(None),
        Placement::Default => DEFAULT_NEURON_DENSITY,
        Placement::Density(density) => density,
    };
    if nodes == 0 {
        return Positions::new(2, Vec::new()).map(Some);
    }
    let shape = Rectangle::for_density(nodes, density)?;
    uniform_positions(rng, &shape, nodes, options.retry_budget()).map(Some)
}

/// Regenerates the edges of an existing container with `model`.
///
/// Existing edges are cleared first. Nodes are connected only when the
/// container holds more than one node. The directedness of the container
/// overrides `options`.
///
/// # Errors
/// Propagates failures of placement, of [`connect_groups`] and of the
/// container.
#[instrument(
    name = "generation.generate_into",
    err,
    skip(rng, graph, model, placement),
    fields(model = %model.kind(), nodes = graph.node_nb()),
)]
pub fn generate_into<R, G>(
    rng: &mut R,
    graph: &mut G,
    model: &GraphModel,
    options: GraphOptions,
    placement: Placement,
) -> Result<()>
where
    R: Rng + ?Sized,
    G: GraphContainer + ?Sized,
{
    let options = options.with_directed(graph.is_directed());
    graph.clear_all_edges();
    if model.uses_positions() {
        if let Some(positions) = place(rng, graph, placement, options)? {
            graph.set_positions(positions)?;
        }
    }
    let nodes = graph.node_nb();
    if nodes > 1 {
        let ids: Vec<NodeId> = (0..nodes).collect();
        let out = connect_groups(rng, &ids, &ids, model, options, graph.positions())?;
        graph.new_edges(&out.edges)?;
        if let Some(distances) = out.distances {
            graph.set_distances(distances)?;
        }
    }
    graph.set_graph_type(model.graph_type());
    debug!(edges = graph.edge_nb(), "container filled");
    Ok(())
}

/// Builds a new [`Graph`] of `nodes` nodes connected with `model`.
///
/// # Errors
/// Same as [`generate_into`].
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{
///     DistanceRuleParams, GraphContainer, GraphModel, GraphOptions, Placement, generate,
/// };
///
/// let model = GraphModel::DistanceRule(DistanceRuleParams::new(0.1)?.with_max_proba(0.5)?);
/// let mut rng = SmallRng::seed_from_u64(11);
/// let graph = generate(&mut rng, &model, 50, GraphOptions::default(), Placement::Default)?;
/// assert_eq!(graph.name(), "DR");
/// assert_eq!(graph.graph_type(), Some("exp_distance_rule"));
/// assert_eq!(graph.positions().map(|p| p.len()), Some(50));
/// assert_eq!(graph.distances().map(<[f64]>::len), Some(graph.edge_nb()));
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    model: &GraphModel,
    nodes: usize,
    options: GraphOptions,
    placement: Placement,
) -> Result<Graph> {
    let mut graph = Graph::new(model.kind().default_name(), nodes, options.directed());
    generate_into(rng, &mut graph, model, options, placement)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{
        ConnectionSpec, DegreeType, GenerationErrorCode, in_degrees,
        test_utils::{node_range, seeded_rng},
    };

    #[rstest]
    fn every_kind_round_trips_through_its_name() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>(), Ok(kind));
        }
    }

    #[rstest]
    fn unknown_model_names_are_rejected() {
        let err = "barabasi".parse::<ModelKind>().expect_err("unregistered");
        assert_eq!(err.code(), GenerationErrorCode::UnknownModel);
    }

    #[rstest]
    fn price_model_reports_missing_backend() {
        let mut rng = seeded_rng(1);
        let ids = node_range(4);
        let err = connect_groups(&mut rng, &ids, &ids, &GraphModel::PriceScaleFree, GraphOptions::default(), None)
            .expect_err("no backend");
        assert_eq!(err, GenerationError::BackendUnavailable { model: "price_scale_free" });
    }

    #[rstest]
    fn distance_rule_without_positions_fails() {
        let mut rng = seeded_rng(1);
        let ids = node_range(4);
        let model = GraphModel::DistanceRule(DistanceRuleParams::new(1.0).expect("valid"));
        let err = connect_groups(&mut rng, &ids, &ids, &model, GraphOptions::default(), None)
            .expect_err("no positions");
        assert_eq!(err.code(), GenerationErrorCode::MissingPositions);
    }

    #[rstest]
    #[case::er(
        GraphModel::ErdosRenyi(ErdosRenyiParams::new(ConnectionSpec::from_density(0.1))),
        "erdos_renyi"
    )]
    #[case::nw(
        GraphModel::NewmanWatts(NewmanWattsParams::new(4, 0.0).expect("valid")),
        "newman_watts"
    )]
    #[case::gaussian(
        GraphModel::GaussianDegree(GaussianDegreeParams::new(3.0, 1.0).expect("valid").with_degree_type(DegreeType::Total)),
        "gaussian_total_degree"
    )]
    #[case::linear(
        GraphModel::DistanceRule(DistanceRuleParams::new(1.0).expect("valid").with_rule(crate::DistanceRule::Linear)),
        "lin_distance_rule"
    )]
    #[case::all(GraphModel::AllToAll(AllToAllParams::default()), "all_to_all")]
    fn labels_follow_model(#[case] model: GraphModel, #[case] expected: &str) {
        assert_eq!(model.graph_type(), expected);
    }

    #[rstest]
    fn generate_builds_labelled_graph() {
        let mut rng = seeded_rng(3);
        let model = GraphModel::FixedDegree(FixedDegreeParams::new(3));
        let graph = generate(&mut rng, &model, 30, GraphOptions::default(), Placement::Default).expect("feasible");
        assert_eq!(graph.name(), "FD");
        assert_eq!(graph.graph_type(), Some("fixed_in_degree"));
        assert_eq!(in_degrees(graph.edges(), 30), vec![3; 30]);
        assert!(graph.positions().is_none());
    }

    #[rstest]
    fn generate_into_replaces_existing_edges() {
        let mut rng = seeded_rng(3);
        let mut graph = Graph::new("custom", 10, true);
        graph.new_edges(&[Edge::new(0, 1), Edge::new(1, 0)]).expect("in range");
        let model = GraphModel::NewmanWatts(NewmanWattsParams::new(2, 0.0).expect("valid"));
        generate_into(&mut rng, &mut graph, &model, GraphOptions::default(), Placement::Default).expect("feasible");
        assert_eq!(graph.name(), "custom");
        assert_eq!(graph.edge_nb(), 20);
        assert_eq!(graph.graph_type(), Some("newman_watts"));
    }

    #[rstest]
    fn single_node_graph_gets_no_edges() {
        let mut rng = seeded_rng(3);
        let model = GraphModel::AllToAll(AllToAllParams::default());
        let graph = generate(&mut rng, &model, 1, GraphOptions::default(), Placement::Default).expect("trivial");
        assert_eq!(graph.edge_nb(), 0);
        assert_eq!(graph.graph_type(), Some("all_to_all"));
    }

    #[rstest]
    fn explicit_positions_feed_distances() {
        let mut rng = seeded_rng(3);
        let positions = Positions::planar(vec![[0.0, 0.0], [3.0, 4.0]]);
        let model = GraphModel::AllToAll(AllToAllParams::default().with_distances(true));
        let graph = generate(&mut rng, &model, 2, GraphOptions::default(), Placement::Positions(positions))
            .expect("two nodes");
        assert_eq!(graph.edges(), &[Edge::new(0, 1), Edge::new(1, 0)]);
        assert_eq!(graph.distances(), Some(&[5.0, 5.0][..]));
    }

    #[rstest]
    fn existing_positions_are_reused() {
        let mut rng = seeded_rng(3);
        let positions = Positions::planar(vec![[0.0, 0.0], [0.5, 0.0], [10.0, 0.0]]);
        let mut graph = Graph::new("spatial", 3, true);
        graph.set_positions(positions.clone()).expect("three rows");
        let model = GraphModel::DistanceRule(
            DistanceRuleParams::new(1.0)
                .expect("valid")
                .with_rule(crate::DistanceRule::Linear)
                .with_max_proba(1.0)
                .expect("valid"),
        );
        generate_into(&mut rng, &mut graph, &model, GraphOptions::default(), Placement::Default).expect("valid");
        assert_eq!(graph.positions(), Some(&positions));
        assert!(graph.edges().iter().all(|edge| edge.source() != 2 && edge.target() != 2));
    }
}
