//! Confirmable, logged deployment workflows for a single-host
//! Node.js application behind Nginx.
//!
//! Three tasks are provided, each an ordered list of steps:
//!
//! - [`Backup`] archives the application folder.
//! - [`Deploy`] stops the running PM2 process, backs up the old
//!   checkout, clones, installs, builds and starts the new one.
//! - [`SslSetup`] renders an Nginx site from a template, enables it
//!   and obtains a certificate with certbot.
//!
//! # Architecture
//!
//! Every task runs the same loop through a
//! [`StepExecutor`](step::StepExecutor): ask the operator, run one
//! external command, record the outcome in the [`RunLog`]. The
//! pieces are injected so the loop can be driven without a terminal
//! or real processes:
//!
//! - [`Config`] is loaded once from a flat `KEY=VALUE` file and
//!   passed to the workflow.
//! - A [`Confirmer`](prompt::Confirmer) answers yes/no prompts
//!   ([`LineConfirmer`](prompt::LineConfirmer) on a terminal).
//! - A [`CommandRunner`](cmd::CommandRunner) runs
//!   [`CommandSpec`](cmd::CommandSpec)s
//!   ([`SystemRunner`](cmd::SystemRunner) spawns real processes).
//!
//! Each step declares what an operator "no" means with a
//! [`SkipPolicy`]: abort the whole run (exit status 0) or skip and
//! continue.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use nodeploy::cmd::SystemRunner;
//! use nodeploy::prompt::LineConfirmer;
//! use nodeploy::workflow::{self, Session};
//! use nodeploy::{Backup, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Path::new("../app.conf"))?;
//!     let mut confirmer = LineConfirmer::stdio();
//!     let mut session = Session::new(&mut confirmer, &SystemRunner, Path::new("../logs"));
//!
//!     let status = workflow::run(&Backup::new(Path::new("..")), config, &mut session);
//!     std::process::exit(i32::from(status.code()));
//! }
//! ```

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod nginx;
pub mod prompt;
pub mod run_log;
pub mod step;
pub mod workflow;

pub use config::Config;
pub use run_log::RunLog;
pub use step::{SkipPolicy, Step};
pub use workflow::backup::Backup;
pub use workflow::deploy::Deploy;
pub use workflow::ssl::{CertificateMode, SslSetup};
pub use workflow::{RunStatus, Workflow};
