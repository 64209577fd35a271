//! Synaptome core library.
//!
//! Stochastic generators for synthetic network topologies: uniform and
//! scale-free random graphs, degree-constrained graphs, ring lattices with
//! small-world shortcuts, and distance-dependent spatial graphs. Every
//! generator takes the caller's random number generator and returns plain
//! edge lists that a [`GraphContainer`] can absorb.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod all_to_all;
mod arithmetic;
mod degree;
mod dispatch;
mod distribution;
mod edge;
mod error;
mod filter;
mod graph;
mod lattice;
mod params;
mod random;
mod sampling;
mod shape;
mod spatial;
mod telemetry;

#[cfg(test)]
mod test_utils;

pub use crate::{
    all_to_all::{AllToAllParams, generate_all_to_all},
    arithmetic::{
        ConnectionCounts, ConnectionSpec, check_num_edges, compute_connections, edge_capacity,
        is_single_population,
    },
    degree::{DegreeType, check_graphical, from_degree_list},
    dispatch::{GeneratedEdges, GraphModel, ModelKind, Placement, connect_groups, generate, generate_into},
    distribution::{
        FixedDegreeParams, GaussianDegreeParams, gaussian_degree_sequence, generate_fixed_degree,
        generate_gaussian_degree,
    },
    edge::{Edge, NodeId, in_degrees, out_degrees, reciprocity},
    error::{ErrorClass, GenerationError, GenerationErrorCode, Result},
    filter::{EdgeAccumulator, FilterPolicy, filter_edges, filter_edges_with_distances},
    graph::{Graph, GraphContainer},
    lattice::{
        NewmanWattsParams, ReciprocityChoice, circular, circular_full, generate_newman_watts,
    },
    params::{GraphOptions, MAX_ATTEMPTS, RetryBudget},
    random::{
        ErdosRenyiParams, RandomScaleFreeParams, generate_erdos_renyi, generate_random_scale_free,
    },
    shape::{Bounds, DEFAULT_NEURON_DENSITY, Rectangle, Shape, uniform_positions},
    spatial::{
        DistanceRule, DistanceRuleParams, Positions, SpatialEdges, connection_probability,
        edge_distances, generate_distance_rule,
    },
};
