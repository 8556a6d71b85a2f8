use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::DeployResult;

/// Format a run stamp: `YYYYMMDD-HHMMSS`.
#[must_use]
pub fn run_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// Append-only audit file for one invocation, named
/// `<prefix>-<stamp>.log`.
///
/// Every line is written straight to the file so an external
/// viewer sees it immediately.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create (or truncate) the log file in `dir` and write the
    /// `<title> - <stamp>` header. The directory is created if
    /// needed.
    pub fn open(dir: &Path, prefix: &str, title: &str, stamp: &str) -> DeployResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{prefix}-{stamp}.log"));
        let file = File::create(&path)?;

        let mut log = Self { path, file };
        log.append(&format!("{title} - {stamp}"))?;
        tracing::debug!(path = %log.path.display(), "run log opened");
        Ok(log)
    }

    /// Append one line. Multi-line text is written as-is with a
    /// single trailing newline.
    pub fn append(&mut self, line: &str) -> DeployResult<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
