//! Two-level ignore filtering for package walks.
//!
//! Only two `.gitignore` files are consulted when deciding whether a path is
//! excluded: the one at the repository root and the one at the package root.
//! Ignore files in intermediate directories are not read. Existing hashes
//! depend on exactly this scope, so it must not grow into full recursive
//! gitignore resolution.
//!
//! # Example
//!
//! ```no_run
//! use taskhash_ignore::IgnoreFilter;
//! use std::path::Path;
//!
//! let filter = IgnoreFilter::two_level(Path::new("/repo"), Path::new("packages/web"))?;
//! if filter.is_excluded(Path::new("packages/web/node_modules/react/index.js"), false) {
//!     // skip it
//! }
//! # Ok::<(), taskhash_ignore::Error>(())
//! ```

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Name of the ignore file read at each of the two levels.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Errors that can occur while compiling ignore rules.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ignore file exists but could not be read.
    #[error("failed to read ignore file {}: {source}", path.display())]
    Io {
        /// Path of the ignore file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The compiled rule set could not be built.
    #[error("invalid ignore rules in {}: {message}", path.display())]
    Parse {
        /// Path of the ignore file.
        path: PathBuf,
        /// Description from the rule compiler.
        message: String,
    },
}

/// Result type for ignore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A compiled set of gitignore rules anchored at one directory.
#[derive(Debug, Clone)]
pub struct RuleSet {
    matcher: Gitignore,
}

impl RuleSet {
    /// A rule set that excludes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Compile the ignore file at `path`, anchored at `root`.
    ///
    /// An absent file yields [`RuleSet::empty`]. Lines that fail to compile
    /// are skipped with a warning, the same way git tolerates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or if the
    /// surviving rules cannot be assembled into a matcher.
    pub fn compile_file(root: &Path, path: &Path) -> Result<Self> {
        if !path.is_file() {
            tracing::trace!(path = %path.display(), "No ignore file, nothing excluded");
            return Ok(Self::empty());
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(path) {
            if err.is_io() {
                let source = err
                    .io_error()
                    .map(|io| std::io::Error::new(io.kind(), io.to_string()))
                    .unwrap_or_else(|| std::io::Error::other(err.to_string()));
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
            tracing::warn!(path = %path.display(), "Skipping invalid ignore rules: {err}");
        }

        let matcher = builder.build().map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            rules = matcher.num_ignores(),
            "Compiled ignore file"
        );

        Ok(Self { matcher })
    }

    /// Whether the rules exclude `relative`, or any directory above it.
    ///
    /// `relative` must be relative to the directory the rules are anchored at.
    #[must_use]
    pub fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        if self.matcher.is_empty() || relative.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// Number of ignore rules in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize
    }

    /// Whether the set has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// The combined root-level and package-level exclusion predicate.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    package_dir: PathBuf,
    root_rules: RuleSet,
    package_rules: RuleSet,
}

impl IgnoreFilter {
    /// Build a filter from already compiled rule sets.
    ///
    /// `package_dir` is the package directory relative to the repository root.
    #[must_use]
    pub fn new(package_dir: impl Into<PathBuf>, root_rules: RuleSet, package_rules: RuleSet) -> Self {
        Self {
            package_dir: package_dir.into(),
            root_rules,
            package_rules,
        }
    }

    /// Compile `<repo_root>/.gitignore` and `<repo_root>/<package_dir>/.gitignore`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file exists but cannot be compiled.
    pub fn two_level(repo_root: &Path, package_dir: &Path) -> Result<Self> {
        let root_rules = RuleSet::compile_file(repo_root, &repo_root.join(IGNORE_FILE_NAME))?;
        let package_root = repo_root.join(package_dir);
        let package_rules =
            RuleSet::compile_file(&package_root, &package_root.join(IGNORE_FILE_NAME))?;
        Ok(Self::new(package_dir, root_rules, package_rules))
    }

    /// Whether `path` (relative to the repository root) is excluded by either level.
    #[must_use]
    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        if self.root_rules.matches(path, is_dir) {
            return true;
        }
        path.strip_prefix(&self.package_dir)
            .is_ok_and(|rel| self.package_rules.matches(rel, is_dir))
    }
}
