//! Edge-list rendering for generated graphs.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use synaptome_core::{GraphContainer, reciprocity};

use super::commands::{CliError, GenerationSummary};

/// Renders `summary` as a tab-separated edge list.
///
/// Header lines start with `# `. Each edge is written as `source\ttarget`,
/// followed by the edge length when the graph carries distances.
///
/// # Errors
/// Propagates failures from `writer`.
pub fn render_edge_list<W: Write>(summary: &GenerationSummary, mut writer: W) -> io::Result<()> {
    let graph = &summary.graph;
    writeln!(writer, "# name: {}", graph.name())?;
    writeln!(writer, "# graph_type: {}", graph.graph_type().unwrap_or("none"))?;
    writeln!(writer, "# directed: {}", graph.is_directed())?;
    writeln!(writer, "# nodes: {}", graph.node_nb())?;
    writeln!(writer, "# edges: {}", graph.edge_nb())?;
    if graph.is_directed() {
        writeln!(writer, "# reciprocity: {:.4}", reciprocity(graph.edges()))?;
    }
    if let Some(seed) = summary.seed {
        writeln!(writer, "# seed: {seed}")?;
    }
    match graph.distances() {
        Some(distances) => {
            for (edge, distance) in graph.edges().iter().zip(distances) {
                writeln!(writer, "{}\t{}\t{distance}", edge.source(), edge.target())?;
            }
        }
        None => {
            for edge in graph.edges() {
                writeln!(writer, "{}\t{}", edge.source(), edge.target())?;
            }
        }
    }
    Ok(())
}

/// Writes the edge list to `path`, or to stdout when no path is given.
///
/// # Errors
/// Returns [`CliError::Io`] when the destination cannot be created or
/// written.
pub fn write_edge_list(summary: &GenerationSummary, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            let io_error = |source| CliError::Io {
                path: path.to_path_buf(),
                source,
            };
            let file = File::create(path).map_err(io_error)?;
            let mut writer = BufWriter::new(file);
            render_edge_list(summary, &mut writer).map_err(io_error)?;
            writer.flush().map_err(io_error)
        }
        None => {
            let io_error = |source| CliError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            };
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            render_edge_list(summary, &mut writer).map_err(io_error)?;
            writer.flush().map_err(io_error)
        }
    }
}
