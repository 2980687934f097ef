//! Git-aware package hashing.
//!
//! Object ids of unchanged tracked files come straight from the index; only
//! files that are modified in the working tree or untracked (and not ignored)
//! are read and hashed.

use crate::hasher::{FileHasher, FileHashes};
use crate::include::IncludeMatcher;
use crate::{Error, Result, hash_file};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Mode git uses for submodule entries in the index.
const GITLINK_MODE: &str = "160000";

/// Lists and hashes package files through the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitFileHasher {
    program: PathBuf,
}

impl GitFileHasher {
    /// Use the `git` found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
        tracing::trace!(dir = %dir.display(), ?args, "Running git");
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .map_err(|e| Error::git(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(format!(
                "`git {}` exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Object ids recorded in the index for files under `dir`.
    fn index_entries(&self, dir: &Path) -> Result<FileHashes> {
        let stdout = self.run(dir, &["ls-files", "--stage", "-z", "--", "."])?;
        let mut entries = FileHashes::new();
        for record in split_nul(&stdout) {
            let (mode, oid, path) = parse_stage_record(record)?;
            if mode == GITLINK_MODE {
                continue;
            }
            entries.insert(path, oid);
        }
        Ok(entries)
    }

    /// Paths under `dir` whose working-tree state differs from the index.
    fn changed_paths(&self, dir: &Path) -> Result<Vec<String>> {
        let stdout = self.run(
            dir,
            &[
                "ls-files",
                "--modified",
                "--others",
                "--exclude-standard",
                "-z",
                "--",
                ".",
            ],
        )?;
        split_nul(&stdout)
            .map(|record| {
                std::str::from_utf8(record)
                    .map(str::to_string)
                    .map_err(|_| Error::git("non UTF-8 path in git output"))
            })
            .collect()
    }
}

impl Default for GitFileHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHasher for GitFileHasher {
    fn name(&self) -> &'static str {
        "git"
    }

    fn file_hashes(
        &self,
        repo_root: &Path,
        package_dir: &Path,
        inputs: &[String],
    ) -> Result<FileHashes> {
        let dir = repo_root.join(package_dir);
        let include = IncludeMatcher::new(inputs)?;

        let mut hashes = self.index_entries(&dir)?;
        let changed = self.changed_paths(&dir)?;
        let changed_count = changed.len();

        for rel in changed {
            let abs = dir.join(&rel);
            if abs.is_file() {
                hashes.insert(rel, hash_file(&abs)?);
            } else {
                // Deleted in the working tree.
                hashes.remove(&rel);
            }
        }

        hashes.retain(|rel, _| include.is_match(Path::new(rel)));

        tracing::debug!(
            package = %package_dir.display(),
            changed = changed_count,
            files = hashes.len(),
            "Git package listing complete"
        );

        Ok(hashes)
    }
}

fn split_nul(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes.split(|b| *b == 0).filter(|record| !record.is_empty())
}

/// Parse one `ls-files --stage` record: `<mode> <oid> <stage>\t<path>`.
fn parse_stage_record(record: &[u8]) -> Result<(String, String, String)> {
    let line = std::str::from_utf8(record).map_err(|_| Error::git("non UTF-8 path in git output"))?;
    let (meta, path) = line
        .split_once('\t')
        .ok_or_else(|| Error::git(format!("unexpected ls-files record: {line}")))?;
    let mut fields = meta.split(' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(mode), Some(oid), Some(_stage)) => {
            Ok((mode.to_string(), oid.to_string(), path.to_string()))
        }
        _ => Err(Error::git(format!("unexpected ls-files record: {line}"))),
    }
}
