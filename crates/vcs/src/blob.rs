//! Git-compatible blob digests for file contents.
//!
//! A blob digest is the SHA-1 of `"blob <len>\0"` followed by the raw bytes,
//! which is what `git hash-object` prints, so digests computed here and object
//! ids read from the git index are interchangeable.

use crate::{Error, Result};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;

/// Compute the git blob digest of `content`.
#[must_use]
pub fn hash_blob(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Read `path` and compute its git blob digest.
///
/// # Errors
///
/// Returns an I/O error naming `path` if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<String> {
    let _span = tracing::trace_span!("hash_file", path = %path.display()).entered();
    let content = fs::read(path).map_err(|e| Error::io(e, path, "read"))?;
    let digest = hash_blob(&content);
    tracing::trace!(path = %path.display(), size = content.len(), "Hashed file");
    Ok(digest)
}
