//! Confirmable, logged units of work.
//!
//! A [`Step`] moves through `pending -> confirming -> running` and
//! ends as succeeded, failed, or skipped. The [`StepExecutor`]
//! drives it and writes exactly one Run Log line for the terminal
//! state before handing control back.

use crate::cmd::{self, CommandOutput, CommandRunner, CommandSpec};
use crate::error::{DeployError, DeployResult};
use crate::prompt::Confirmer;
use crate::run_log::RunLog;

/// What an operator "no" means for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Stop the whole workflow with a success status.
    Abort,
    /// Log the skip and move on to the next step.
    Continue,
}

/// Terminal state of a step that let the workflow go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Skipped,
}

/// Why a workflow stopped early.
#[derive(Debug)]
pub enum Halt {
    /// The operator declined a step whose policy is
    /// [`SkipPolicy::Abort`].
    Declined { step: String },
    /// A step failed. Already logged.
    Failed(DeployError),
    /// An error raised between steps, not yet reported.
    Error(DeployError),
}

impl From<DeployError> for Halt {
    fn from(e: DeployError) -> Self {
        Self::Error(e)
    }
}

/// Handle given to a step action for running commands.
pub struct StepContext<'r> {
    runner: &'r dyn CommandRunner,
}

impl StepContext<'_> {
    /// Run a command; a non-zero exit is an error.
    pub fn run(&self, spec: &CommandSpec) -> DeployResult<CommandOutput> {
        cmd::run(self.runner, spec)
    }

    /// Run a command and return its output whatever the exit
    /// status. Only a failure to start it is an error.
    pub fn probe(&self, spec: &CommandSpec) -> DeployResult<CommandOutput> {
        self.runner.execute(spec)
    }
}

type Action<'a> = Box<dyn FnOnce(&StepContext<'_>) -> DeployResult<String> + 'a>;

/// One unit of work. The action returns the success line written to
/// the Run Log.
///
/// # Example
///
/// ```
/// use nodeploy::cmd::CommandSpec;
/// use nodeploy::step::{SkipPolicy, Step};
///
/// let step = Step::ask("npm install", "Proceed with npm install?")
///     .on_decline(SkipPolicy::Abort)
///     .command(CommandSpec::new("npm").arg("install"), "npm install completed successfully.");
///
/// assert_eq!(step.name(), "npm install");
/// assert_eq!(step.policy(), SkipPolicy::Abort);
/// ```
pub struct Step<'a> {
    name: String,
    prompt: Option<String>,
    on_decline: SkipPolicy,
    action: Option<Action<'a>>,
}

impl<'a> Step<'a> {
    /// A step that asks the operator before running. Declining
    /// aborts the workflow unless [`Step::on_decline`] says otherwise.
    #[must_use]
    pub fn ask(name: &str, prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            prompt: Some(prompt.to_string()),
            on_decline: SkipPolicy::Abort,
            action: None,
        }
    }

    /// A step that runs without asking.
    #[must_use]
    pub fn auto(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prompt: None,
            on_decline: SkipPolicy::Abort,
            action: None,
        }
    }

    #[must_use]
    pub const fn on_decline(mut self, policy: SkipPolicy) -> Self {
        self.on_decline = policy;
        self
    }

    #[must_use]
    pub fn action(
        mut self,
        action: impl FnOnce(&StepContext<'_>) -> DeployResult<String> + 'a,
    ) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Run a single command and log `success` when it exits zero.
    #[must_use]
    pub fn command(self, spec: CommandSpec, success: &str) -> Self {
        let success = success.to_string();
        self.action(move |ctx| {
            ctx.run(&spec)?;
            Ok(success)
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn policy(&self) -> SkipPolicy {
        self.on_decline
    }
}

/// Drives steps one at a time against a confirmer, a command runner
/// and the Run Log.
pub struct StepExecutor<'e> {
    workflow: &'e str,
    confirmer: &'e mut dyn Confirmer,
    runner: &'e dyn CommandRunner,
    log: &'e mut RunLog,
}

impl<'e> StepExecutor<'e> {
    #[must_use]
    pub fn new(
        workflow: &'e str,
        confirmer: &'e mut dyn Confirmer,
        runner: &'e dyn CommandRunner,
        log: &'e mut RunLog,
    ) -> Self {
        Self {
            workflow,
            confirmer,
            runner,
            log,
        }
    }

    /// Execute one step to a terminal state.
    ///
    /// Returns `Err(Halt)` when the workflow must stop: either an
    /// abort-policy decline or a failure. Both are already logged.
    pub fn execute(&mut self, step: Step<'_>) -> Result<StepOutcome, Halt> {
        let Step {
            name,
            prompt,
            on_decline,
            action,
        } = step;

        if let Some(prompt) = prompt {
            tracing::debug!(step = %name, "confirming");
            let confirmed = match self.confirmer.confirm(&prompt) {
                Ok(answer) => answer,
                Err(e) => return Err(self.fail(&name, e)),
            };

            if !confirmed {
                return self.decline(name, on_decline);
            }
        }

        tracing::debug!(step = %name, "running");
        let ctx = StepContext {
            runner: self.runner,
        };
        let result = action.map_or_else(|| Ok(format!("{name}: confirmed.")), |run| run(&ctx));

        match result {
            Ok(message) => {
                self.log.append(&message).map_err(|e| self.fail(&name, e))?;
                println!("{message}");
                tracing::info!(step = %name, "succeeded");
                Ok(StepOutcome::Succeeded)
            }
            Err(e) => Err(self.fail(&name, e)),
        }
    }

    /// Write an informational line to the Run Log and the operator.
    pub fn note(&mut self, line: &str) -> DeployResult<()> {
        self.log.append(line)?;
        println!("{line}");
        Ok(())
    }

    fn decline(&mut self, name: String, policy: SkipPolicy) -> Result<StepOutcome, Halt> {
        match policy {
            SkipPolicy::Abort => {
                let message = format!(
                    "User opted to skip '{name}'. Aborting {}.",
                    self.workflow
                );
                self.note(&message).map_err(|e| self.fail(&name, e))?;
                tracing::info!(step = %name, "declined, aborting");
                Err(Halt::Declined { step: name })
            }
            SkipPolicy::Continue => {
                let message = format!("'{name}' skipped by user.");
                self.note(&message).map_err(|e| self.fail(&name, e))?;
                tracing::info!(step = %name, "declined, continuing");
                Ok(StepOutcome::Skipped)
            }
        }
    }

    fn fail(&mut self, name: &str, error: DeployError) -> Halt {
        let message = format!("Error during '{name}': {error}");
        if let Err(log_err) = self.log.append(&message) {
            tracing::error!(step = %name, error = %log_err, "could not write failure to run log");
        }
        eprintln!("{message}");
        tracing::error!(step = %name, error = %error, "failed");
        Halt::Failed(error)
    }
}
