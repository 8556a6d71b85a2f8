pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid line in config file (line {line}): {content}")]
    MalformedConfig { line: usize, content: String },

    #[error("missing configuration key: {0}")]
    MissingKey(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("command failed: {command} ({status}){detail}")]
    CommandFailed {
        command: String,
        status: String,
        detail: String,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed configuration or a required key missing.
    Config,
    /// A filesystem path a step depends on is absent.
    Precondition,
    /// An external program could not be run or exited non-zero.
    ExternalCommand,
    /// Local I/O or serialisation failure.
    Io,
}

impl DeployError {
    pub(crate) fn command_failed(command: String, code: Option<i32>, stderr: &str) -> Self {
        let status = code.map_or_else(
            || "terminated by signal".to_string(),
            |c| format!("exit status {c}"),
        );
        let detail = if stderr.is_empty() {
            String::new()
        } else {
            format!(": {stderr}")
        };
        Self::CommandFailed {
            command,
            status,
            detail,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedConfig { .. } | Self::MissingKey(_) => ErrorKind::Config,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::CommandFailed { .. } | Self::CommandNotFound(_) => ErrorKind::ExternalCommand,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}
