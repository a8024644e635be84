//! Content-based hashing of primitive sets, used as a graph cache key.

use crate::config::BuildConfig;
use crate::primitive::PrimitiveSet;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the canonical JSON of `primitives`.
///
/// Primitives are stored in id order, so insertion order does not change the digest.
pub fn fingerprint(primitives: &PrimitiveSet) -> String {
    digest(primitives)
}

/// SHA-256 hex digest of the builder settings. Any tolerance or cost change
/// yields a different value.
pub fn settings_digest(config: &BuildConfig) -> String {
    digest(config)
}

fn digest<T: Serialize>(value: &T) -> String {
    let mut hasher = Sha256::new();

    let json = serde_json::to_string(value).unwrap_or_default();
    hasher.update(json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
