//! The file-hashing capability and its primary/fallback selection.

use crate::git::GitFileHasher;
use crate::walk::WalkFileHasher;
use crate::{Result, hash_object};
use std::collections::BTreeMap;
use std::path::Path;

/// Map from package-relative path (always `/`-separated) to blob digest.
pub type FileHashes = BTreeMap<String, String>;

/// Something that can list and hash the input files of one package.
pub trait FileHasher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Hash every input file of the package at `repo_root/package_dir`.
    ///
    /// `inputs` are glob patterns relative to the package directory; an empty
    /// slice selects every file.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be listed or read.
    fn file_hashes(&self, repo_root: &Path, package_dir: &Path, inputs: &[String])
    -> Result<FileHashes>;
}

/// Hashes package inputs with an optional primary hasher and the manual walk
/// as fallback.
pub struct PackageFileHasher {
    primary: Option<Box<dyn FileHasher>>,
    fallback: WalkFileHasher,
}

impl PackageFileHasher {
    /// Git-aware hashing, falling back to a manual walk.
    #[must_use]
    pub fn new() -> Self {
        Self::with_primary(Box::new(GitFileHasher::new()))
    }

    /// Manual walk only.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            primary: None,
            fallback: WalkFileHasher,
        }
    }

    /// Use `primary` first and the manual walk when it fails.
    #[must_use]
    pub fn with_primary(primary: Box<dyn FileHasher>) -> Self {
        Self {
            primary: Some(primary),
            fallback: WalkFileHasher,
        }
    }

    /// Per-file digests of the package inputs.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if the primary hasher failed and the
    /// manual walk failed too.
    pub fn file_hashes(
        &self,
        repo_root: &Path,
        package_dir: &Path,
        inputs: &[String],
    ) -> Result<FileHashes> {
        if let Some(primary) = &self.primary {
            match primary.file_hashes(repo_root, package_dir, inputs) {
                Ok(hashes) => return Ok(hashes),
                Err(e) => {
                    tracing::warn!(
                        hasher = primary.name(),
                        package = %package_dir.display(),
                        "Falling back to manual file hashing: {e}"
                    );
                }
            }
        }
        self.fallback.file_hashes(repo_root, package_dir, inputs)
    }

    /// A single digest over all of the package's input files.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be hashed.
    pub fn hash_package(
        &self,
        repo_root: &Path,
        package_dir: &Path,
        inputs: &[String],
    ) -> Result<String> {
        let _span = tracing::debug_span!(
            "package_files.hash",
            package = %package_dir.display(),
            inputs = inputs.len()
        )
        .entered();

        let hashes = self.file_hashes(repo_root, package_dir, inputs)?;
        let digest = hash_object(&hashes)?;
        tracing::debug!(files = hashes.len(), digest = %digest, "Hashed package files");
        Ok(digest)
    }
}

impl Default for PackageFileHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PackageFileHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageFileHasher")
            .field("primary", &self.primary.as_ref().map(|p| p.name()))
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, hash_blob};
    use tempfile::TempDir;

    struct Failing;

    impl FileHasher for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn file_hashes(&self, _: &Path, _: &Path, _: &[String]) -> Result<FileHashes> {
            Err(Error::git("not a repository"))
        }
    }

    struct Fixed(FileHashes);

    impl FileHasher for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn file_hashes(&self, _: &Path, _: &Path, _: &[String]) -> Result<FileHashes> {
            Ok(self.0.clone())
        }
    }

    fn package(tmp: &TempDir) -> &Path {
        std::fs::create_dir_all(tmp.path().join("pkg-a")).unwrap();
        std::fs::write(tmp.path().join("pkg-a/index.js"), "console.log(1)").unwrap();
        Path::new("pkg-a")
    }

    #[test]
    fn failing_primary_falls_back_to_walk() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);

        let hasher = PackageFileHasher::with_primary(Box::new(Failing));
        let hashes = hasher.file_hashes(tmp.path(), dir, &[]).unwrap();

        assert_eq!(hashes.len(), 1);
        assert_eq!(hashes["index.js"], hash_blob(b"console.log(1)"));
    }

    #[test]
    fn successful_primary_is_used() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);
        let fixed = FileHashes::from([("x".to_string(), "y".to_string())]);

        let hasher = PackageFileHasher::with_primary(Box::new(Fixed(fixed.clone())));
        assert_eq!(hasher.file_hashes(tmp.path(), dir, &[]).unwrap(), fixed);
    }

    #[test]
    fn fallback_errors_are_fatal() {
        let tmp = TempDir::new().unwrap();

        let hasher = PackageFileHasher::with_primary(Box::new(Failing));
        let err = hasher
            .hash_package(tmp.path(), Path::new("missing"), &[])
            .unwrap_err();
        assert!(matches!(err, Error::MissingPackageDir { .. }));
    }

    #[test]
    fn package_digest_is_object_hash_of_file_map() {
        let tmp = TempDir::new().unwrap();
        let dir = package(&tmp);

        let digest = PackageFileHasher::manual()
            .hash_package(tmp.path(), dir, &[])
            .unwrap();
        let expected = hash_object(&FileHashes::from([(
            "index.js".to_string(),
            hash_blob(b"console.log(1)"),
        )]))
        .unwrap();
        assert_eq!(digest, expected);
    }
}
