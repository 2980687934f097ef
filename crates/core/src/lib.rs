//! Cache keys for monorepo tasks.
//!
//! This crate computes a stable digest for every task of a task graph. Two
//! runs produce the same digest exactly when everything that can affect the
//! task's output is unchanged:
//! - The package's input files
//! - The task definition and its declared outputs
//! - Declared environment variables
//! - The repository-wide global hash
//! - The digests of all upstream tasks
//!
//! # Stages
//!
//! 1. [`Tracker::calculate_file_hashes`] hashes every distinct package/input
//!    combination in the graph once, on a bounded worker pool.
//! 2. [`Tracker::calculate_task_hash`] composes a task's digest. Callers
//!    invoke it in dependency order; [`hash_task_graph`] does both stages for a
//!    whole [`taskhash_task_graph::TaskGraph`].

#![expect(
    clippy::missing_errors_doc,
    reason = "Failure modes are documented on the Error variants"
)]

mod config;
mod error;
mod file_spec;
mod package;
mod package_task;
mod pipeline;
mod tracker;
mod walk;

pub use error::{Error, Result};

pub use config::{HashingConfig, WORKERS_ENV};
pub use file_spec::PackageFileSpec;
pub use package::{PackageInfo, PackageRegistry};
pub use package_task::PackageTask;
pub use pipeline::{DEFAULT_OUTPUTS, Pipeline, TaskDefinition};
pub use tracker::Tracker;
pub use walk::hash_task_graph;
