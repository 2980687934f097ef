//! Error types for the hashing engine

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for file-hash and task-hash computation
///
/// Every lookup miss is its own variant naming the missing key. None of them
/// is ever turned into a default value.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A graph vertex is not a `<package>#<task>` identifier
    #[error("Invalid task identifier '{task_id}'")]
    #[diagnostic(
        code(taskhash::core::invalid_task_id),
        help("Task identifiers have the form <package>#<task>")
    )]
    InvalidTaskId {
        /// The offending identifier
        task_id: String,
    },

    /// No pipeline entry matches the task
    #[error("No task definition found for '{task_id}'")]
    #[diagnostic(
        code(taskhash::core::missing_task_definition),
        help("The task graph references a task the pipeline does not define")
    )]
    MissingTaskDefinition {
        /// The task that has no definition
        task_id: String,
    },

    /// The package registry has no entry for a package
    #[error("Unknown package '{package}'")]
    #[diagnostic(code(taskhash::core::missing_package))]
    MissingPackage {
        /// The package name
        package: String,
    },

    /// A task's package file hash was never computed
    #[error("No file hash recorded for '{key}'")]
    #[diagnostic(
        code(taskhash::core::missing_file_hash),
        help("Run the file-hash stage over the full task graph before hashing tasks")
    )]
    MissingFileHash {
        /// Normalized package file spec key
        key: String,
    },

    /// A dependency was not hashed before its dependent
    #[error("Task '{task_id}' depends on '{dependency}', which has not been hashed")]
    #[diagnostic(
        code(taskhash::core::missing_dependency_hash),
        help("Hash tasks in dependency order")
    )]
    MissingDependencyHash {
        /// The task being hashed
        task_id: String,
        /// The dependency without a recorded hash
        dependency: String,
    },

    /// A task hash was computed twice in one run
    #[error("Hash for task '{task_id}' was already computed")]
    #[diagnostic(code(taskhash::core::task_hash_already_computed))]
    TaskHashAlreadyComputed {
        /// The task that was hashed twice
        task_id: String,
    },

    /// The worker pool could not be started
    #[error("Failed to start hashing workers: {message}")]
    #[diagnostic(code(taskhash::core::worker_pool))]
    WorkerPool {
        /// Description of the failure
        message: String,
    },

    /// Configuration or pipeline file could not be read or parsed
    #[error("Configuration error{}: {message}", path.as_ref().map_or(String::new(), |p| format!(" in {}", p.display())))]
    #[diagnostic(code(taskhash::core::configuration))]
    Configuration {
        /// File the error came from, if any
        path: Option<Box<Path>>,
        /// Description of the problem
        message: String,
    },

    /// File hashing failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Vcs(#[from] taskhash_vcs::Error),

    /// The task graph is malformed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] taskhash_task_graph::Error),
}

impl Error {
    /// Create an invalid task id error
    #[must_use]
    pub fn invalid_task_id(task_id: impl Into<String>) -> Self {
        Self::InvalidTaskId {
            task_id: task_id.into(),
        }
    }

    /// Create a missing task definition error
    #[must_use]
    pub fn missing_task_definition(task_id: impl Into<String>) -> Self {
        Self::MissingTaskDefinition {
            task_id: task_id.into(),
        }
    }

    /// Create a missing package error
    #[must_use]
    pub fn missing_package(package: impl Into<String>) -> Self {
        Self::MissingPackage {
            package: package.into(),
        }
    }

    /// Create a configuration error tied to a file
    #[must_use]
    pub fn configuration(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: Some(path.as_ref().into()),
            message: message.into(),
        }
    }

    /// Create a configuration error without a file
    #[must_use]
    pub fn configuration_no_path(message: impl Into<String>) -> Self {
        Self::Configuration {
            path: None,
            message: message.into(),
        }
    }
}

/// Result type for hashing operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_key() {
        assert_eq!(
            Error::MissingFileHash {
                key: "pkg-a#".into()
            }
            .to_string(),
            "No file hash recorded for 'pkg-a#'"
        );
        assert_eq!(
            Error::MissingDependencyHash {
                task_id: "b#build".into(),
                dependency: "a#build".into(),
            }
            .to_string(),
            "Task 'b#build' depends on 'a#build', which has not been hashed"
        );
    }

    #[test]
    fn configuration_message_includes_path() {
        let err = Error::configuration("turbo.json", "expected value");
        assert_eq!(
            err.to_string(),
            "Configuration error in turbo.json: expected value"
        );
        let err = Error::configuration_no_path("bad worker count");
        assert_eq!(err.to_string(), "Configuration error: bad worker count");
    }
}
