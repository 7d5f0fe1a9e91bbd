//! Pseudo-Cache Read-Through
//!
//! Streams a source into a throwaway buffer without writing anything
//! locally. Useful for warming an OS or appliance cache ahead of playback.
//! Single-threaded by design; this is not the copy pipeline.

use std::io::Read;

use tracing::info;

use crate::errors::CacheError;
use crate::progress::ProgressReporter;
use crate::source::{self, SourceDescriptor};

/// Throwaway buffer size for the read loop
const WARM_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Stream the source to completion, discarding the bytes
///
/// Applies the same skip rule as the cache command: local sources are only
/// read when `cache_non_network_paths` is set. Returns the number of bytes
/// read, or 0 when skipped.
pub fn run(path: &str, cache_non_network_paths: bool) -> Result<u64, CacheError> {
    let descriptor = SourceDescriptor::classify(path);

    if !descriptor.is_remote() && !cache_non_network_paths {
        info!(path = path, "Skipping pseudo-cache, source is not a network path");
        return Ok(0);
    }

    let stream = source::open(&descriptor)?;
    let mut reader = stream.reader;
    let total_len = stream.len;

    let progress = ProgressReporter::new(descriptor.base_file_name(), total_len);
    let mut buffer = vec![0u8; WARM_BUFFER_SIZE];
    let mut pos: u64 = 0;

    while pos < total_len {
        let count = match reader.read(&mut buffer) {
            Ok(0) => {
                return Err(CacheError::SourceUnreadable(format!(
                    "stream ended after {pos} of {total_len} bytes"
                )))
            }
            Ok(n) => n,
            Err(e) => return Err(CacheError::SourceUnreadable(e.to_string())),
        };
        pos += count as u64;
        progress.report(pos);
    }

    info!(path = path, bytes = pos, "Pseudo-cache read complete");
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_local_path_skipped_without_flag() {
        // Path does not even need to exist when skipped
        let read = run("/no/such/file.bin", false).unwrap();
        assert_eq!(read, 0);
    }

    #[test]
    fn test_local_path_read_through_with_flag() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("media.bin");
        fs::write(&file, vec![7u8; 4096]).unwrap();

        let read = run(file.to_str().unwrap(), true).unwrap();
        assert_eq!(read, 4096);
        // Source untouched
        assert_eq!(fs::metadata(&file).unwrap().len(), 4096);
    }

    #[test]
    fn test_missing_source_with_flag_is_not_found() {
        match run("/no/such/file.bin", true) {
            Err(CacheError::SourceNotFound(_)) => {}
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }
}
