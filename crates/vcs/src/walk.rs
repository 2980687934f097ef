//! Manual package hashing by walking the file system.

use crate::hasher::{FileHasher, FileHashes};
use crate::include::IncludeMatcher;
use crate::{Error, Result, hash_file};
use std::path::{Component, Path};
use taskhash_ignore::IgnoreFilter;
use walkdir::WalkDir;

/// Walks the package directory, honouring the root and package `.gitignore`.
///
/// Used when no version-control information is available. Symlinks are not
/// followed and directories are never recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkFileHasher;

impl FileHasher for WalkFileHasher {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn file_hashes(
        &self,
        repo_root: &Path,
        package_dir: &Path,
        inputs: &[String],
    ) -> Result<FileHashes> {
        let walk_root = repo_root.join(package_dir);
        if !walk_root.is_dir() {
            return Err(Error::MissingPackageDir {
                path: walk_root.into(),
            });
        }

        let ignore = IgnoreFilter::two_level(repo_root, package_dir)?;
        let include = IncludeMatcher::new(inputs)?;

        let mut hashes = FileHashes::new();
        let mut visited: u64 = 0;

        let walker = WalkDir::new(&walk_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                // Never prune the package directory itself.
                if entry.depth() == 0 {
                    return true;
                }
                entry
                    .path()
                    .strip_prefix(repo_root)
                    .map_or(true, |rel| !ignore.is_excluded(rel, entry.file_type().is_dir()))
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&walk_root).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("file system loop"));
                Error::io(source, path, "walk")
            })?;
            visited += 1;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&walk_root) else {
                continue;
            };
            if !include.is_match(rel) {
                continue;
            }

            let digest = hash_file(entry.path())?;
            hashes.insert(to_slash(rel), digest);
        }

        tracing::debug!(
            package = %package_dir.display(),
            entries_visited = visited,
            files = hashes.len(),
            "Manual package walk complete"
        );

        Ok(hashes)
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
