//! Task definitions keyed by task name or package-task identifier.
//!
//! The pipeline is read from the `pipeline` object of the monorepo config:
//!
//! ```json
//! {
//!   "pipeline": {
//!     "build": { "dependsOn": ["^build", "$NODE_ENV"], "outputs": ["dist/**"] },
//!     "web#test": { "inputs": ["src/**/*.ts"], "env": ["CI"] }
//!   }
//! }
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use taskhash_task_graph::package_task_from_id;

const ENV_PREFIX: &str = "$";
const TOPOLOGICAL_PREFIX: &str = "^";

/// Outputs assumed when a definition does not declare any.
pub const DEFAULT_OUTPUTS: [&str; 2] = ["dist/**/*", "build/**/*"];

/// What a task reads, writes and depends on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTaskDefinition")]
pub struct TaskDefinition {
    /// Output globs, relative to the package.
    pub outputs: Vec<String>,
    /// Input globs, relative to the package. Empty means every file.
    pub inputs: Vec<String>,
    /// Environment variables whose values are part of the hash, sorted.
    pub env_var_dependencies: Vec<String>,
    /// Tasks of the same package that must run first.
    ///
    /// Not part of any hash. Kept for the graph builder that turns the
    /// pipeline into task graph edges.
    pub task_dependencies: Vec<String>,
    /// Tasks that must run first in every dependency package (`^task`).
    ///
    /// Not part of any hash. Kept for the graph builder, like
    /// [`TaskDefinition::task_dependencies`].
    pub topological_dependencies: Vec<String>,
}

impl Default for TaskDefinition {
    fn default() -> Self {
        Self {
            outputs: DEFAULT_OUTPUTS.iter().map(|s| (*s).to_string()).collect(),
            inputs: Vec::new(),
            env_var_dependencies: Vec::new(),
            task_dependencies: Vec::new(),
            topological_dependencies: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskDefinition {
    #[serde(default)]
    outputs: Option<Vec<String>>,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    env: Vec<String>,
}

impl From<RawTaskDefinition> for TaskDefinition {
    fn from(raw: RawTaskDefinition) -> Self {
        let mut env: BTreeSet<String> = raw.env.into_iter().collect();
        let mut task_dependencies = Vec::new();
        let mut topological_dependencies = Vec::new();

        for dependency in raw.depends_on {
            if let Some(var) = dependency.strip_prefix(ENV_PREFIX) {
                env.insert(var.to_string());
            } else if let Some(task) = dependency.strip_prefix(TOPOLOGICAL_PREFIX) {
                topological_dependencies.push(task.to_string());
            } else {
                task_dependencies.push(dependency);
            }
        }

        Self {
            outputs: raw
                .outputs
                .unwrap_or_else(|| DEFAULT_OUTPUTS.iter().map(|s| (*s).to_string()).collect()),
            inputs: raw.inputs,
            env_var_dependencies: env.into_iter().collect(),
            task_dependencies,
            topological_dependencies,
        }
    }
}

#[derive(Deserialize)]
struct PipelineFile {
    #[serde(default)]
    pipeline: BTreeMap<String, TaskDefinition>,
}

/// Lookup from task name (`build`) or task id (`web#build`) to its definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the definition for `name`.
    pub fn insert(&mut self, name: impl Into<String>, definition: TaskDefinition) {
        self.tasks.insert(name.into(), definition);
    }

    /// Builder form of [`Pipeline::insert`].
    #[must_use]
    pub fn with_task(mut self, name: impl Into<String>, definition: TaskDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    /// Definition for `task_id`.
    ///
    /// A package-specific entry (`web#build`) wins over the generic one
    /// (`build`).
    #[must_use]
    pub fn get_task_definition(&self, task_id: &str) -> Option<&TaskDefinition> {
        if let Some(definition) = self.tasks.get(task_id) {
            return Some(definition);
        }
        let (_, task) = package_task_from_id(task_id)?;
        self.tasks.get(task)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the pipeline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Parse the `pipeline` object out of a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let file: PipelineFile = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            Error::configuration_no_path(format!("invalid pipeline at `{}`: {}", e.path(), e.inner()))
        })?;
        Ok(Self { tasks: file.pipeline })
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let _span = tracing::debug_span!("pipeline.load", path = %path.display()).entered();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(path, format!("failed to read: {e}")))?;
        let pipeline = Self::from_json_str(&json).map_err(|e| match e {
            Error::Configuration { message, .. } => Error::configuration(path, message),
            other => other,
        })?;
        tracing::debug!(tasks = pipeline.len(), "Loaded pipeline");
        Ok(pipeline)
    }
}
