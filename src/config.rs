use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DeployError, DeployResult};

/// Flat `KEY=VALUE` configuration shared by every workflow.
///
/// Entries keep file order so the operator sees them the way they
/// were written. Duplicate keys keep the last value.
///
/// # Example
///
/// ```
/// use nodeploy::Config;
///
/// let config = Config::parse("# app\nAPP_NAME_GITHUB=\"site\"\nPORT=3000\n").unwrap();
///
/// assert_eq!(config.get("APP_NAME_GITHUB"), Some("site"));
/// assert_eq!(config.require("PORT").unwrap(), "3000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Config {
    entries: IndexMap<String, String>,
}

impl Config {
    /// Parse configuration text.
    ///
    /// Blank lines and lines starting with `#` are ignored. Every
    /// other line is split on its first `=`; keys and values are
    /// trimmed and surrounding double quotes are stripped from the
    /// value. A line without `=`, or with an empty key, is rejected.
    pub fn parse(content: &str) -> DeployResult<Self> {
        let mut entries = IndexMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(DeployError::MalformedConfig {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(DeployError::MalformedConfig {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }

            let value = value.trim().trim_matches('"');
            entries.insert(key.to_string(), value.to_string());
        }

        Ok(Self { entries })
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeployError::Precondition(format!(
                    "configuration file not found: {}",
                    path.display()
                ))
            } else {
                DeployError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), keys = config.len(), "configuration loaded");
        Ok(config)
    }

    /// Return a copy with a derived key inserted.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a key that a step cannot run without.
    pub fn require(&self, key: &str) -> DeployResult<&str> {
        self.get(key)
            .ok_or_else(|| DeployError::MissingKey(key.to_string()))
    }

    /// Fail on the first key of `keys` that is absent.
    pub fn require_all(&self, keys: &[&str]) -> DeployResult<()> {
        for key in keys {
            self.require(key)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render `KEY: value` lines with keys padded to a common width.
    #[must_use]
    pub fn display_lines(&self) -> Vec<String> {
        let width = self.entries.keys().map(String::len).max().unwrap_or(0);
        self.iter()
            .map(|(k, v)| format!("{:<width$}: {v}", k.to_uppercase()))
            .collect()
    }
}
