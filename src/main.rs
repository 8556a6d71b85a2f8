use std::process::ExitCode;

use clap::Parser;
use nodeploy::cli::{self, Cli};
use nodeploy::logging;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level)?;
    tracing::debug!(command = ?cli.command, "starting");

    Ok(cli::run(&cli).into())
}
