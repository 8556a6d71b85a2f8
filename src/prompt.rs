use std::collections::VecDeque;
use std::io::{self, BufRead, Stdout, StdinLock, Write};

use crate::error::{DeployError, DeployResult};

/// Source of yes/no answers for step confirmations.
pub trait Confirmer {
    /// Ask `prompt` and block until a yes (`true`) or no (`false`)
    /// answer is available.
    fn confirm(&mut self, prompt: &str) -> DeployResult<bool>;
}

/// Interpret an answer line. Only `y` and `n` are accepted, in
/// either case.
#[must_use]
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

/// Line-based prompt over a reader/writer pair, re-asking until a
/// valid answer arrives. End of input is an error.
pub struct LineConfirmer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirmer<R, W> {
    #[must_use]
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the confirmer and return the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl LineConfirmer<StdinLock<'static>, Stdout> {
    /// Prompt on the process terminal.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirmer for LineConfirmer<R, W> {
    fn confirm(&mut self, prompt: &str) -> DeployResult<bool> {
        let rule = "#".repeat(76);
        writeln!(self.output, "\n{rule}\n# {prompt}\n{rule}")?;

        loop {
            write!(self.output, "Answer (y/n): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(DeployError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed while waiting for confirmation",
                )));
            }

            if let Some(answer) = parse_answer(&line) {
                return Ok(answer);
            }
            writeln!(self.output, "Invalid input. Please enter 'y' or 'n'.")?;
        }
    }
}

/// Answers yes to everything without prompting.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, prompt: &str) -> DeployResult<bool> {
        tracing::info!(prompt, "confirmed automatically");
        Ok(true)
    }
}

/// Replays a fixed list of answers and records the prompts it was
/// asked. Running out of answers is an error, like closed stdin.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

impl ScriptedConfirmer {
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts asked so far, in order.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, prompt: &str) -> DeployResult<bool> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            DeployError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for: {prompt}"),
            ))
        })
    }
}
