use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{DeployError, DeployResult};

/// A single external program invocation: argument vector,
/// optional working directory, and whether output is captured.
///
/// Uncaptured commands inherit the terminal so the operator sees
/// their progress directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub capture: bool,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Append a path argument.
    #[must_use]
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub const fn capture(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished command. `stdout`/`stderr` are empty when
/// the command was not captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Capability for invoking external programs. Returns `Err` only
/// when the program could not be started; a non-zero exit is a
/// normal [`CommandOutput`].
pub trait CommandRunner {
    fn execute(&self, spec: &CommandSpec) -> DeployResult<CommandOutput>;
}

/// Runs commands as real child processes, blocking until exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, spec: &CommandSpec) -> DeployResult<CommandOutput> {
        tracing::debug!(command = %spec, cwd = ?spec.cwd, capture = spec.capture, "spawning");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let output = if spec.capture {
            let output = command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(|e| spawn_error(&spec.program, e))?;
            CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
        } else {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| spawn_error(&spec.program, e))?;
            CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            }
        };

        tracing::debug!(command = %spec, status = ?output.code, "finished");
        Ok(output)
    }
}

/// Run a command and fail unless it exits with status zero.
pub fn run(runner: &dyn CommandRunner, spec: &CommandSpec) -> DeployResult<CommandOutput> {
    let output = runner.execute(spec)?;
    if output.success() {
        Ok(output)
    } else {
        Err(DeployError::command_failed(
            spec.to_string(),
            output.code,
            &output.stderr,
        ))
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}
