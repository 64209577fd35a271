//! Benchmark parameter labels.

use std::fmt;

/// Size of a generated graph, used as the Criterion parameter label.
#[derive(Clone, Copy, Debug)]
pub struct GraphBenchParams {
    /// Number of nodes.
    pub nodes: usize,
    /// Directed or undirected generation.
    pub directed: bool,
}

impl fmt::Display for GraphBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.directed { "directed" } else { "undirected" };
        write!(f, "n={},{kind}", self.nodes)
    }
}
