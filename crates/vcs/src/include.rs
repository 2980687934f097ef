//! Include-pattern matching for package inputs.

use crate::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Decides whether a package-relative path is one of the task's inputs.
///
/// With no patterns every path is included. Otherwise a path is included when
/// it matches at least one pattern. `*` stays within one path segment, `**`
/// spans directories and `{a,b}` alternation is supported.
#[derive(Debug, Clone)]
pub struct IncludeMatcher {
    set: Option<GlobSet>,
}

impl IncludeMatcher {
    /// Compile `patterns` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns a glob error naming the first pattern that fails to compile.
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::all());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| Error::glob(pattern, e.kind().to_string()))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| Error::glob(patterns.join(","), e.to_string()))?;

        Ok(Self { set: Some(set) })
    }

    /// A matcher that includes every path.
    #[must_use]
    pub fn all() -> Self {
        Self { set: None }
    }

    /// Whether the package-relative `path` is included.
    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        self.set.as_ref().is_none_or(|set| set.is_match(path))
    }
}
