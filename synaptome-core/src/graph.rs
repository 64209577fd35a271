//! Graph containers that receive generated edges.

use std::borrow::Cow;

use crate::{
    edge::{Edge, NodeId},
    error::{GenerationError, Result},
    spatial::Positions,
};

/// Destination for generated topologies.
///
/// The generators only need to count nodes and edges, append or clear edges,
/// and attach optional per-edge distances, node positions and a label.
pub trait GraphContainer {
    /// Number of nodes.
    fn node_nb(&self) -> usize;

    /// Number of edges currently stored.
    fn edge_nb(&self) -> usize;

    /// Returns `true` for directed containers.
    fn is_directed(&self) -> bool;

    /// Positions of the nodes, if any.
    fn positions(&self) -> Option<&Positions>;

    /// Appends `edges`.
    ///
    /// # Errors
    /// Returns [`GenerationError::PositionOutOfRange`] when an edge references
    /// a node the container does not hold.
    fn new_edges(&mut self, edges: &[Edge]) -> Result<()>;

    /// Removes every edge together with any stored distances.
    fn clear_all_edges(&mut self);

    /// Stores one distance per edge, aligned with insertion order.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when the length differs
    /// from the edge count.
    fn set_distances(&mut self, distances: Vec<f64>) -> Result<()>;

    /// Stores node positions.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidPositions`] when the table does not
    /// hold one row per node.
    fn set_positions(&mut self, positions: Positions) -> Result<()>;

    /// Labels the container with the model that produced its edges.
    fn set_graph_type(&mut self, graph_type: Cow<'static, str>);
}

/// In-memory edge list implementing [`GraphContainer`].
///
/// # Examples
/// ```
/// use synaptome_core::{Edge, Graph, GraphContainer};
///
/// let mut graph = Graph::new("demo", 3, true);
/// graph.new_edges(&[Edge::new(0, 1), Edge::new(1, 2)])?;
/// assert_eq!(graph.edge_nb(), 2);
/// graph.clear_all_edges();
/// assert_eq!(graph.edge_nb(), 0);
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Graph {
    name: String,
    nodes: usize,
    directed: bool,
    edges: Vec<Edge>,
    distances: Option<Vec<f64>>,
    positions: Option<Positions>,
    graph_type: Option<Cow<'static, str>>,
}

impl Graph {
    /// Empty graph holding nodes `0..nodes`.
    #[must_use]
    pub fn new(name: impl Into<String>, nodes: usize, directed: bool) -> Self {
        Self {
            name: name.into(),
            nodes,
            directed,
            edges: Vec::new(),
            distances: None,
            positions: None,
            graph_type: None,
        }
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored edges.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the stored edge distances.
    #[must_use]
    pub fn distances(&self) -> Option<&[f64]> {
        self.distances.as_deref()
    }

    /// Returns the generating model label.
    #[must_use]
    pub fn graph_type(&self) -> Option<&str> {
        self.graph_type.as_deref()
    }

    /// Node ids `0..node_nb`.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes).collect()
    }
}

impl GraphContainer for Graph {
    #[rustfmt::skip]
    fn node_nb(&self) -> usize { self.nodes }

    #[rustfmt::skip]
    fn edge_nb(&self) -> usize { self.edges.len() }

    #[rustfmt::skip]
    fn is_directed(&self) -> bool { self.directed }

    fn positions(&self) -> Option<&Positions> {
        self.positions.as_ref()
    }

    fn new_edges(&mut self, edges: &[Edge]) -> Result<()> {
        if let Some(edge) = edges
            .iter()
            .find(|edge| edge.source().max(edge.target()) >= self.nodes)
        {
            return Err(GenerationError::PositionOutOfRange {
                node: edge.source().max(edge.target()),
                len: self.nodes,
            });
        }
        self.edges.extend_from_slice(edges);
        self.distances = None;
        Ok(())
    }

    fn clear_all_edges(&mut self) {
        self.edges.clear();
        self.distances = None;
    }

    fn set_distances(&mut self, distances: Vec<f64>) -> Result<()> {
        if distances.len() != self.edges.len() {
            return Err(GenerationError::invalid(
                "distances",
                format!("{} values for {} edges", distances.len(), self.edges.len()),
            ));
        }
        self.distances = Some(distances);
        Ok(())
    }

    fn set_positions(&mut self, positions: Positions) -> Result<()> {
        if positions.len() != self.nodes {
            return Err(GenerationError::InvalidPositions {
                reason: format!("{} rows for {} nodes", positions.len(), self.nodes),
            });
        }
        self.positions = Some(positions);
        Ok(())
    }

    fn set_graph_type(&mut self, graph_type: Cow<'static, str>) {
        self.graph_type = Some(graph_type);
    }
}
