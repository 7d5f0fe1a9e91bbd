//! Cache Key Derivation
//!
//! Maps a source path to a stable local cache file name. The on-disk name
//! keeps the source's base file name for human scanning and appends an
//! uppercase SHA-1 of the normalized path for collision resistance.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::source::base_file_name;

/// Derive the local cache path for a source path
///
/// Deterministic: the same source string always yields the same local path.
/// Two source strings that normalize to the same separator-canonical form
/// intentionally collide (same cached artifact).
pub fn derive_local_path(source_path: &str, cache_dir: &Path) -> PathBuf {
    let digest = Sha1::digest(normalize_separators(source_path).as_bytes());
    let file_name = base_file_name(source_path);
    cache_dir.join(format!("{}_{}", file_name, hex::encode_upper(digest)))
}

/// Normalize both separator styles to `/` so the digest is identical across
/// platforms and spelling variants
fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
