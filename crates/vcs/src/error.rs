//! Error types for the vcs crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for file hashing operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error while reading or walking package files
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(taskhash::vcs::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "walk")
        operation: String,
    },

    /// The package directory does not exist
    #[error("Package directory not found: {}", path.display())]
    #[diagnostic(
        code(taskhash::vcs::missing_package_dir),
        help("The workspace layout may be stale; re-run package discovery")
    )]
    MissingPackageDir {
        /// The directory that was expected
        path: Box<Path>,
    },

    /// The git-aware hasher could not produce a result
    #[error("git file hashing failed: {message}")]
    #[diagnostic(code(taskhash::vcs::git))]
    Git {
        /// Description of what went wrong
        message: String,
    },

    /// An input glob pattern could not be compiled
    #[error("Invalid input pattern '{pattern}': {message}")]
    #[diagnostic(code(taskhash::vcs::glob))]
    Glob {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Ignore rules could not be compiled
    #[error(transparent)]
    #[diagnostic(code(taskhash::vcs::ignore))]
    Ignore(#[from] taskhash_ignore::Error),

    /// Serialization error while hashing a structured value
    #[error("Serialization error: {message}")]
    #[diagnostic(code(taskhash::vcs::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a git error
    #[must_use]
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git {
            message: msg.into(),
        }
    }

    /// Create a glob error
    #[must_use]
    pub fn glob(pattern: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Glob {
            pattern: pattern.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }
}

/// Result type for file hashing operations
pub type Result<T> = std::result::Result<T, Error>;
