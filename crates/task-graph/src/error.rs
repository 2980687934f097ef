//! Error types for task graph operations.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or ordering a task graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Error {
    /// Some tasks depend on each other in a loop.
    #[error("Dependency cycle between tasks: {}", tasks.join(", "))]
    #[diagnostic(
        code(taskhash::task_graph::cycle),
        help("Remove one of the dependencies between these tasks")
    )]
    CycleDetected {
        /// Sorted ids of the tasks on the cycle.
        tasks: Vec<String>,
    },

    /// Tasks name dependencies that are not vertices of the graph.
    #[error("Missing dependencies: {}", format_missing(missing))]
    #[diagnostic(
        code(taskhash::task_graph::missing_dependencies),
        help("Add the missing tasks to the graph before adding dependency edges")
    )]
    MissingDependencies {
        /// `(task, missing dependency)` pairs.
        missing: Vec<(String, String)>,
    },
}

fn format_missing(missing: &[(String, String)]) -> String {
    missing
        .iter()
        .map(|(task, dep)| format!("'{task}' needs '{dep}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
