//! `synaptome` binary: generates one graph and prints its edge list.
//!
//! Logging is installed before argument handling so every failure is
//! reported through `tracing`; the process exits non-zero on any error.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use synaptome_cli::{
    cli::{Cli, CliError, run_cli, write_edge_list},
    logging::{self, LoggingError},
};
use tracing::{error, field};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let output = cli.output.clone();
    let summary = run_cli(cli).context("graph generation failed")?;
    write_edge_list(&summary, output.as_deref()).context("failed to write edge list")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let code = err.downcast_ref::<CliError>().and_then(|cli_error| match cli_error {
            CliError::Core(core) => Some(core.code()),
            CliError::Io { .. } => None,
        });
        let class = err.downcast_ref::<CliError>().and_then(|cli_error| match cli_error {
            CliError::Core(core) => Some(core.class()),
            CliError::Io { .. } => None,
        });
        error!(
            error = %format_args!("{err:#}"),
            code = code.map(|code| field::display(code.as_str())),
            class = class.map(field::debug),
            "command execution failed"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(clippy::print_stderr, reason = "tracing is not installed yet")]
fn report_logging_error(err: &LoggingError) {
    eprintln!("failed to initialise logging: {err}");
}
