//! Argument parsing and command execution for the synaptome CLI.

use std::{io, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use rand::{SeedableRng, rngs::SmallRng};
use synaptome_core::{
    AllToAllParams, ConnectionSpec, DegreeType, DistanceRule, DistanceRuleParams, ErdosRenyiParams,
    FixedDegreeParams, GaussianDegreeParams, GenerationError, Graph, GraphModel, GraphOptions, MAX_ATTEMPTS,
    NewmanWattsParams, Placement, RandomScaleFreeParams, ReciprocityChoice, RetryBudget, generate,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_NODES: usize = 100;
const DEFAULT_DENSITY: f64 = 0.1;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "synaptome", about = "Generate synthetic network topologies as edge lists.")]
pub struct Cli {
    /// Number of nodes in the generated graph.
    #[arg(long, global = true, default_value_t = DEFAULT_NODES)]
    pub nodes: usize,

    /// Seed for the random generator (drawn from the OS when omitted).
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Generate an undirected graph.
    #[arg(long, global = true)]
    pub undirected: bool,

    /// Allow repeated edges between the same pair of nodes.
    #[arg(long, global = true)]
    pub multigraph: bool,

    /// Rounds granted to each retry loop before giving up.
    #[arg(long = "max-attempts", global = true, default_value_t = MAX_ATTEMPTS)]
    pub max_attempts: usize,

    /// Write the edge list to this file instead of stdout.
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Graph model to generate.
    #[command(subcommand)]
    pub command: Command,
}

/// One subcommand per graph model.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Connect every node to every other node.
    AllToAll {
        /// Also report edge lengths from uniformly placed positions.
        #[arg(long)]
        distances: bool,
    },
    /// Uniform random graph.
    ErdosRenyi(ErdosRenyiArgs),
    /// Random graph with power-law in- and out-degrees.
    RandomScaleFree(ScaleFreeArgs),
    /// Preferential attachment (needs an external backend).
    PriceScaleFree,
    /// Ring lattice plus random shortcuts.
    NewmanWatts(NewmanWattsArgs),
    /// Every node gets the same degree.
    FixedDegree(DegreeArgs),
    /// Normally distributed degrees.
    GaussianDegree(GaussianDegreeArgs),
    /// Distance-dependent connection probability on uniformly placed nodes.
    DistanceRule(DistanceRuleArgs),
}

/// Edge-count target shared by the density-driven models.
#[derive(Debug, Args, Clone, Default)]
pub struct ConnectionArgs {
    /// Fraction of the `nodes²` possible pairs to connect.
    #[arg(long)]
    pub density: Option<f64>,

    /// Exact number of edges.
    #[arg(long)]
    pub edges: Option<usize>,

    /// Average number of edges per node.
    #[arg(long = "avg-deg")]
    pub avg_deg: Option<f64>,
}

impl ConnectionArgs {
    pub(super) fn to_spec(&self, default_density: f64) -> ConnectionSpec {
        let spec = ConnectionSpec::default();
        let spec = self.density.map_or(spec, |density| spec.with_density(density));
        let spec = self.edges.map_or(spec, |edges| spec.with_edges(edges));
        let spec = self.avg_deg.map_or(spec, |avg_deg| spec.with_avg_deg(avg_deg));
        if spec.is_empty() {
            ConnectionSpec::from_density(default_density)
        } else {
            spec
        }
    }
}

/// Options of the `erdos-renyi` command.
#[derive(Debug, Args, Clone)]
pub struct ErdosRenyiArgs {
    /// Edge-count target (density 0.1 when omitted).
    #[command(flatten)]
    pub connections: ConnectionArgs,

    /// Fraction of reciprocal edges.
    #[arg(long)]
    pub reciprocity: Option<f64>,
}

/// Options of the `random-scale-free` command.
#[derive(Debug, Args, Clone)]
pub struct ScaleFreeArgs {
    /// In-degree exponent.
    #[arg(long = "in-exp")]
    pub in_exp: f64,

    /// Out-degree exponent.
    #[arg(long = "out-exp")]
    pub out_exp: f64,

    /// Edge-count target (density 0.1 when omitted).
    #[command(flatten)]
    pub connections: ConnectionArgs,

    /// Fraction of reciprocal edges.
    #[arg(long)]
    pub reciprocity: Option<f64>,
}

/// Options of the `newman-watts` command.
#[derive(Debug, Args, Clone)]
pub struct NewmanWattsArgs {
    /// Neighbours per node on the ring (even).
    #[arg(long = "coord-nb")]
    pub coord_nb: usize,

    /// Shortcut probability per lattice edge.
    #[arg(long = "proba-shortcut")]
    pub proba_shortcut: f64,

    /// Reciprocity of the directed ring.
    #[arg(long = "reciprocity-circular", default_value_t = 1.0)]
    pub reciprocity_circular: f64,

    /// How reciprocal ring edges are picked (`random`, `closest`,
    /// `closest-ordered`).
    #[arg(long = "reciprocity-choice", default_value = "random")]
    pub reciprocity_choice: ReciprocityChoice,

    /// Fixes the total edge count instead of drawing the shortcut count.
    #[arg(long)]
    pub edges: Option<usize>,
}

/// Options of the `fixed-degree` command.
#[derive(Debug, Args, Clone)]
pub struct DegreeArgs {
    /// Degree of every node.
    #[arg(long)]
    pub degree: usize,

    /// Which degree is fixed (`in`, `out`, `total`).
    #[arg(long = "degree-type", default_value = "in")]
    pub degree_type: DegreeType,
}

/// Options of the `gaussian-degree` command.
#[derive(Debug, Args, Clone)]
pub struct GaussianDegreeArgs {
    /// Mean degree.
    #[arg(long)]
    pub avg: f64,

    /// Standard deviation of the degree.
    #[arg(long)]
    pub std: f64,

    /// Which degree is drawn (`in`, `out`, `total`).
    #[arg(long = "degree-type", default_value = "in")]
    pub degree_type: DegreeType,
}

/// Options of the `distance-rule` command.
#[derive(Debug, Args, Clone)]
pub struct DistanceRuleArgs {
    /// Characteristic length of the rule.
    #[arg(long)]
    pub scale: f64,

    /// Decay rule (`exp` or `lin`).
    #[arg(long, default_value = "exp")]
    pub rule: DistanceRule,

    /// Connect every candidate pair independently with at most this
    /// probability instead of targeting an edge count.
    #[arg(long = "max-proba")]
    pub max_proba: Option<f64>,

    /// Nodes per unit area of the square the nodes are placed in.
    #[arg(long = "neuron-density")]
    pub neuron_density: Option<f64>,

    /// Edge-count target (density 0.1 when omitted).
    #[command(flatten)]
    pub connections: ConnectionArgs,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Writing the edge list failed.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Destination that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Generation failed.
    #[error(transparent)]
    Core(#[from] GenerationError),
}

/// Outcome of a generation command.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Seed the generator was started from, when one was given.
    pub seed: Option<u64>,
    /// Generated graph.
    pub graph: Graph,
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Self::AllToAll { .. } => "all-to-all",
            Self::ErdosRenyi(_) => "erdos-renyi",
            Self::RandomScaleFree(_) => "random-scale-free",
            Self::PriceScaleFree => "price-scale-free",
            Self::NewmanWatts(_) => "newman-watts",
            Self::FixedDegree(_) => "fixed-degree",
            Self::GaussianDegree(_) => "gaussian-degree",
            Self::DistanceRule(_) => "distance-rule",
        }
    }

    pub(super) fn into_model(self) -> Result<(GraphModel, Placement), GenerationError> {
        let model = match self {
            Self::AllToAll { distances } => GraphModel::AllToAll(AllToAllParams::default().with_distances(distances)),
            Self::ErdosRenyi(args) => {
                let params = ErdosRenyiParams::new(args.connections.to_spec(DEFAULT_DENSITY));
                GraphModel::ErdosRenyi(match args.reciprocity {
                    Some(reciprocity) => params.with_reciprocity(reciprocity),
                    None => params,
                })
            }
            Self::RandomScaleFree(args) => {
                let params = RandomScaleFreeParams::new(args.in_exp, args.out_exp)?
                    .with_connections(args.connections.to_spec(DEFAULT_DENSITY));
                GraphModel::RandomScaleFree(match args.reciprocity {
                    Some(reciprocity) => params.with_reciprocity(reciprocity),
                    None => params,
                })
            }
            Self::PriceScaleFree => GraphModel::PriceScaleFree,
            Self::NewmanWatts(args) => {
                let params = NewmanWattsParams::new(args.coord_nb, args.proba_shortcut)?
                    .with_reciprocity_circular(args.reciprocity_circular)?
                    .with_reciprocity_choice(args.reciprocity_choice);
                GraphModel::NewmanWatts(match args.edges {
                    Some(edges) => params.with_edges(edges),
                    None => params,
                })
            }
            Self::FixedDegree(args) => {
                GraphModel::FixedDegree(FixedDegreeParams::new(args.degree).with_degree_type(args.degree_type))
            }
            Self::GaussianDegree(args) => GraphModel::GaussianDegree(
                GaussianDegreeParams::new(args.avg, args.std)?.with_degree_type(args.degree_type),
            ),
            Self::DistanceRule(args) => {
                let params = DistanceRuleParams::new(args.scale)?
                    .with_rule(args.rule)
                    .with_connections(args.connections.to_spec(DEFAULT_DENSITY));
                let params = match args.max_proba {
                    Some(max_proba) => params.with_max_proba(max_proba)?,
                    None => params,
                };
                let placement = args.neuron_density.map_or(Placement::Default, Placement::Density);
                return Ok((GraphModel::DistanceRule(params), placement));
            }
        };
        Ok((model, Placement::Default))
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError::Core`] when the parameters are invalid or generation
/// fails.
///
/// # Examples
/// ```
/// use clap::Parser;
/// use synaptome_cli::cli::{Cli, run_cli};
/// use synaptome_core::GraphContainer;
///
/// let cli = Cli::parse_from(["synaptome", "--nodes", "20", "--seed", "1", "fixed-degree", "--degree", "3"]);
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.graph.edge_nb(), 60);
/// # Ok::<(), synaptome_cli::cli::CliError>(())
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty, nodes = cli.nodes, seed = ?cli.seed),
)]
pub fn run_cli(cli: Cli) -> Result<GenerationSummary, CliError> {
    Span::current().record("command", field::display(cli.command.label()));
    let options = GraphOptions::new(!cli.undirected, cli.multigraph)
        .with_retry_budget(RetryBudget::new(cli.max_attempts)?);
    let (model, placement) = cli.command.into_model()?;
    let mut rng = cli
        .seed
        .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
    let graph = generate(&mut rng, &model, cli.nodes, options, placement)?;
    info!(
        graph_type = graph.graph_type().unwrap_or_default(),
        edges = graph.edges().len(),
        "command completed"
    );
    Ok(GenerationSummary { seed: cli.seed, graph })
}
