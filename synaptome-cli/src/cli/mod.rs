//! Command-line interface for generating synthetic network topologies.
//!
//! One subcommand per graph model; global flags size the graph, seed the
//! generator and choose where the edge list is written.

mod commands;
mod output;

pub use commands::{
    Cli, CliError, Command, ConnectionArgs, DegreeArgs, DistanceRuleArgs, ErdosRenyiArgs, GaussianDegreeArgs,
    GenerationSummary, NewmanWattsArgs, ScaleFreeArgs, run_cli,
};
pub use output::{render_edge_list, write_edge_list};
