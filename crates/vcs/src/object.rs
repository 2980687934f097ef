//! Digest of arbitrary serializable values.

use crate::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute a deterministic digest of `value`.
///
/// The value is converted to a JSON value first, which orders object keys, and
/// then hashed in compact form. Sequences keep their order, so callers sort
/// any list whose order is not significant before hashing.
///
/// # Errors
///
/// Returns a serialization error if `value` cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn hash_object<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value)
        .map_err(|e| Error::serialization(format!("Failed to encode value: {e}")))?;
    let bytes = serde_json::to_vec(&json)
        .map_err(|e| Error::serialization(format!("Failed to serialize value: {e}")))?;
    let digest = Sha256::digest(bytes);
    Ok(hex::encode(digest))
}
