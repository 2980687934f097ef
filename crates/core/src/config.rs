//! Hashing configuration.
//!
//! Read from a TOML file, every key optional:
//!
//! ```toml
//! workerCount = 8
//! rootNode = "___ROOT___"
//! repoRoot = "."
//! useVcs = true
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taskhash_task_graph::ROOT_NODE_NAME;
use taskhash_vcs::PackageFileHasher;

/// Environment variable overriding [`HashingConfig::worker_count`].
pub const WORKERS_ENV: &str = "TASKHASH_WORKERS";

/// Settings for one hashing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashingConfig {
    /// Size of the file hashing and task hashing worker pools.
    pub worker_count: usize,
    /// Name of the synthetic root vertex of the task graph.
    pub root_node: String,
    /// Repository root that package directories are relative to.
    pub repo_root: PathBuf,
    /// Ask git for file hashes before walking the file system.
    pub use_vcs: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map_or(1, usize::from),
            root_node: ROOT_NODE_NAME.to_string(),
            repo_root: PathBuf::from("."),
            use_vcs: true,
        }
    }
}

impl HashingConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::configuration_no_path(e.message().to_string()))
    }

    /// Read a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(path, format!("failed to read: {e}")))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::configuration(path, e.message()))?;
        Ok(config.with_env_overrides())
    }

    /// Apply `TASKHASH_WORKERS` when it holds a positive integer.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(WORKERS_ENV)
            && !value.is_empty()
        {
            match value.parse::<usize>() {
                Ok(count) if count > 0 => self.worker_count = count,
                _ => tracing::warn!(
                    variable = WORKERS_ENV,
                    value = %value,
                    "Ignoring worker count override, expected a positive integer"
                ),
            }
        }
        self
    }

    /// The package file hasher selected by [`HashingConfig::use_vcs`].
    #[must_use]
    pub fn file_hasher(&self) -> PackageFileHasher {
        if self.use_vcs {
            PackageFileHasher::new()
        } else {
            PackageFileHasher::manual()
        }
    }
}
