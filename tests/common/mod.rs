#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use nodeploy::cmd::{CommandOutput, CommandRunner, CommandSpec};
use nodeploy::error::{DeployError, DeployResult};

pub const STAMP: &str = "20240101-120000";

/// Records every command and answers with canned outputs matched
/// by command-line prefix. Unmatched commands succeed silently.
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    responses: Vec<(String, CommandOutput)>,
    missing: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prefix: &str, code: i32, stdout: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: if code == 0 {
                    String::new()
                } else {
                    format!("{prefix} exploded")
                },
            },
        ));
        self
    }

    /// Fail to start `program`, as if it were not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, spec: &CommandSpec) -> DeployResult<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        if self.missing.contains(&spec.program) {
            return Err(DeployError::CommandNotFound(spec.program.clone()));
        }
        let line = spec.to_string();
        Ok(self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            }))
    }
}

pub fn read_log(logs_dir: &Path, prefix: &str) -> String {
    fs::read_to_string(log_path(logs_dir, prefix)).expect("run log missing")
}

pub fn log_path(logs_dir: &Path, prefix: &str) -> PathBuf {
    logs_dir.join(format!("{prefix}-{STAMP}.log"))
}

pub fn display(path: &Path) -> String {
    path.display().to_string()
}
