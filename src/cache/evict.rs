//! Cache Eviction
//!
//! Keeps the cache directory under its size budget by deleting the least
//! recently accessed files. The snapshot is rebuilt from filesystem
//! metadata on every pass; there is no persisted index to corrupt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

/// One regular file in the cache directory snapshot
#[derive(Debug, Clone)]
struct SnapshotEntry {
    path: PathBuf,
    size: u64,
    last_accessed: SystemTime,
}

/// Delete least-recently-accessed cache files until the directory's total
/// size fits the budget
///
/// Called once after a successful miss. The single most-recently-accessed
/// file is never deleted, even if it alone exceeds the budget (it is the
/// file just written and about to be forwarded). Per-file delete failures
/// are logged and skipped; they never abort the pass.
pub fn enforce(cache_dir: &Path, max_size_bytes: u64) {
    // Most recently accessed first
    let mut entries = snapshot(cache_dir);
    entries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));

    let mut total: u64 = entries.iter().map(|e| e.size).sum();
    if total <= max_size_bytes {
        return;
    }

    info!(
        total_mb = total / (1024 * 1024),
        max_mb = max_size_bytes / (1024 * 1024),
        "Cache exceeds max size, evicting stale files"
    );

    while total > max_size_bytes && entries.len() > 1 {
        let stale = entries.pop().expect("len > 1 checked above");
        match fs::remove_file(&stale.path) {
            Ok(()) => {
                total -= stale.size;
                debug!(path = %stale.path.display(), size = stale.size, "Evicted cached file");
            }
            Err(e) => {
                warn!(path = %stale.path.display(), error = %e, "Failed to evict cached file");
            }
        }
    }
}

/// Enumerate regular files directly under the cache directory
fn snapshot(cache_dir: &Path) -> Vec<SnapshotEntry> {
    let read_dir = match fs::read_dir(cache_dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!(dir = %cache_dir.display(), error = %e, "Failed to scan cache directory");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let last_accessed = metadata
            .accessed()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push(SnapshotEntry {
            path: entry.path(),
            size: metadata.len(),
            last_accessed,
        });
    }
    entries
}
