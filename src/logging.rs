//! Diagnostic logging via `tracing` + `tracing-subscriber`.
//!
//! This is separate from the Run Log: it goes to stderr and is
//! quiet by default so prompts stay readable.
//!
//! Level priority:
//! 1. `--log-level` flag
//! 2. `NODEPLOY_LOG` environment variable (an `EnvFilter` directive,
//!    e.g. `debug` or `nodeploy=trace`)
//! 3. `warn`

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "NODEPLOY_LOG";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = cli_level.map_or_else(
        || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        |level| EnvFilter::new(level.as_str()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}
