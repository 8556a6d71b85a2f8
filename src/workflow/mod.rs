pub mod backup;
pub mod deploy;
pub mod ssl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;

use crate::cmd::CommandRunner;
use crate::config::Config;
use crate::error::DeployResult;
use crate::prompt::Confirmer;
use crate::run_log::{self, RunLog};
use crate::step::{Halt, StepExecutor};

/// A task expressed as an ordered sequence of steps.
///
/// Steps are built inside [`Workflow::steps`] right before each one
/// runs, so a step can depend on what earlier steps left on disk.
pub trait Workflow {
    /// Short name used in abort messages (e.g. `"backup"`).
    fn name(&self) -> &'static str;

    /// Run Log file prefix: `<prefix>-<stamp>.log`.
    fn log_prefix(&self) -> &'static str;

    /// Run Log header title: `<title> - <stamp>`.
    fn log_title(&self) -> &'static str;

    /// Keys that must be present before anything runs.
    fn required_keys(&self) -> Vec<&'static str>;

    /// Insert keys computed from the loaded configuration. Called
    /// after the required keys have been checked.
    fn derive(&self, config: Config) -> DeployResult<Config> {
        Ok(config)
    }

    /// Execute the steps in order.
    fn steps(&self, config: &Config, exec: &mut StepExecutor<'_>) -> Result<(), Halt>;
}

/// How a workflow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step ran.
    Completed,
    /// The operator stopped the run at an abort-policy step.
    Declined,
    /// Configuration, precondition, or command failure.
    Failed,
}

impl RunStatus {
    /// Process exit status: declining is not a failure.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Completed | Self::Declined => 0,
            Self::Failed => 1,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        Self::from(status.code())
    }
}

/// Capabilities and locations shared by one invocation.
pub struct Session<'s> {
    confirmer: &'s mut dyn Confirmer,
    runner: &'s dyn CommandRunner,
    logs_dir: PathBuf,
    stamp: String,
}

impl<'s> Session<'s> {
    /// Create a session stamped with the current local time.
    #[must_use]
    pub fn new(
        confirmer: &'s mut dyn Confirmer,
        runner: &'s dyn CommandRunner,
        logs_dir: &Path,
    ) -> Self {
        Self {
            confirmer,
            runner,
            logs_dir: logs_dir.to_path_buf(),
            stamp: run_log::run_stamp(&Local::now()),
        }
    }

    /// Override the run stamp.
    #[must_use]
    pub fn stamp(mut self, stamp: &str) -> Self {
        self.stamp = stamp.to_string();
        self
    }
}

/// Run a workflow against an already loaded configuration.
///
/// Required keys are checked and derived keys inserted before the
/// Run Log is opened, so configuration errors have no side effects.
pub fn run(workflow: &dyn Workflow, config: Config, session: &mut Session<'_>) -> RunStatus {
    let config = config.with("TIMESTAMP", session.stamp.as_str());
    let prepared = config
        .require_all(&workflow.required_keys())
        .and_then(|()| workflow.derive(config));
    let config = match prepared {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            tracing::error!(workflow = workflow.name(), error = %e, "configuration rejected");
            return RunStatus::Failed;
        }
    };

    let mut log = match RunLog::open(
        &session.logs_dir,
        workflow.log_prefix(),
        workflow.log_title(),
        &session.stamp,
    ) {
        Ok(log) => log,
        Err(e) => {
            eprintln!(
                "Cannot open run log in {}: {e}",
                session.logs_dir.display()
            );
            return RunStatus::Failed;
        }
    };

    tracing::info!(workflow = workflow.name(), log = %log.path().display(), "workflow started");

    let result = {
        let mut exec = StepExecutor::new(
            workflow.name(),
            &mut *session.confirmer,
            session.runner,
            &mut log,
        );
        workflow.steps(&config, &mut exec)
    };

    let status = match result {
        Ok(()) => RunStatus::Completed,
        Err(Halt::Declined { step }) => {
            tracing::info!(
                workflow = workflow.name(),
                step = %step,
                "workflow aborted by operator"
            );
            RunStatus::Declined
        }
        Err(Halt::Failed(_)) => RunStatus::Failed,
        Err(Halt::Error(e)) => {
            let message = format!("Error during {}: {e}", workflow.name());
            if let Err(log_err) = log.append(&message) {
                tracing::error!(error = %log_err, "could not write failure to run log");
            }
            eprintln!("{message}");
            tracing::error!(workflow = workflow.name(), error = %e, "workflow failed");
            RunStatus::Failed
        }
    };

    println!("\nRun logged to: {}", log.path().display());
    status
}

/// Log the configuration line by line for the operator to verify.
pub(crate) fn show_configuration(
    config: &Config,
    exec: &mut StepExecutor<'_>,
) -> DeployResult<()> {
    exec.note("Loaded configuration:")?;
    for (key, value) in config.iter() {
        exec.note(&format!("{key}: {value}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::SystemRunner;
    use crate::prompt::ScriptedConfirmer;

    struct NeedsUnlistedKey;

    impl Workflow for NeedsUnlistedKey {
        fn name(&self) -> &'static str {
            "lookup"
        }

        fn log_prefix(&self) -> &'static str {
            "lookup"
        }

        fn log_title(&self) -> &'static str {
            "Lookup log"
        }

        fn required_keys(&self) -> Vec<&'static str> {
            Vec::new()
        }

        fn steps(&self, config: &Config, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
            exec.note("starting")?;
            config.require("UNLISTED")?;
            exec.note("unreachable")?;
            Ok(())
        }
    }

    #[test]
    fn error_between_steps_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut confirmer = ScriptedConfirmer::new([]);
        let mut session =
            Session::new(&mut confirmer, &SystemRunner, dir.path()).stamp("20240101-120000");

        let status = run(&NeedsUnlistedKey, Config::default(), &mut session);

        assert_eq!(status, RunStatus::Failed);
        let log =
            std::fs::read_to_string(dir.path().join("lookup-20240101-120000.log")).unwrap();
        assert_eq!(
            log,
            "Lookup log - 20240101-120000\nstarting\n\
             Error during lookup: missing configuration key: UNLISTED\n"
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(RunStatus::Completed.code(), 0);
        assert_eq!(RunStatus::Declined.code(), 0);
        assert_eq!(RunStatus::Failed.code(), 1);
    }
}
