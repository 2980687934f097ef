//! Package input-file hashing for taskhash
//!
//! This crate turns the files of one package into digests:
//! - Git-compatible blob digests for single files
//! - A canonical digest for any serializable value
//! - Per-package path → digest maps, filtered by include globs and the
//!   two-level ignore rules
//!
//! # Hashers
//!
//! [`PackageFileHasher`] asks the git-aware [`GitFileHasher`] first, which
//! reads object ids from the index and only rehashes dirty or untracked files.
//! When git is unavailable or fails, it walks the package directory with
//! [`WalkFileHasher`] instead. The two agree on a clean checkout whose ignore
//! rules live only at the repository and package roots.

mod error;

pub mod blob;
pub mod git;
pub mod hasher;
pub mod include;
pub mod object;
pub mod walk;

pub use error::{Error, Result};

pub use blob::{hash_blob, hash_file};
pub use git::GitFileHasher;
pub use hasher::{FileHasher, FileHashes, PackageFileHasher};
pub use include::IncludeMatcher;
pub use object::hash_object;
pub use walk::WalkFileHasher;
