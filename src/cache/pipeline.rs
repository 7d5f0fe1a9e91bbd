//! Stream Copy Pipeline
//!
//! Copies a source stream to a local file while overlapping read and write
//! I/O. Two fixed-size buffers are exchanged between the invoking (read)
//! thread and one spawned writer thread over a pair of bounded capacity-1
//! channels: `filled` carries a buffer plus its valid length to the writer,
//! `free` carries the drained buffer back. Moving the buffers through the
//! channels guarantees single-writer access without any locking.
//!
//! On failure the partially written destination file is left in place; the
//! orchestrator must treat any non-success as a failed miss and never
//! promote a partial file to a hit.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info, warn};

use crate::errors::CacheError;
use crate::progress::ProgressReporter;

/// Transfer buffer size: 4 MiB per buffer, two buffers in flight
pub const BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Copy `total_len` bytes from `source` into a newly created file at `dest`
///
/// Returns the number of bytes written on success. The destination file is
/// created up front, so a zero-length source yields an empty file and an
/// immediate success. A failure on either side leaves the partial file in
/// place and is surfaced as the pipeline's result.
pub fn run(
    source: &mut dyn Read,
    total_len: u64,
    dest: &Path,
    buffer_size: usize,
    progress: &ProgressReporter,
) -> Result<u64, CacheError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| CacheError::write(parent, e))?;
    }
    let dest_file = File::create(dest).map_err(|e| CacheError::write(dest, e))?;

    if total_len == 0 {
        debug!(dest = %dest.display(), "Zero-length source, created empty destination");
        return Ok(0);
    }

    // "data ready" / "buffer free" as capacity-1 channels carrying the
    // buffers themselves
    let (filled_tx, filled_rx) = mpsc::sync_channel::<(Vec<u8>, usize)>(1);
    let (free_tx, free_rx) = mpsc::sync_channel::<Vec<u8>>(1);

    // Pre-load the spare buffer so the first swap never waits on the writer
    free_tx
        .send(vec![0u8; buffer_size])
        .expect("free channel has capacity for the spare buffer");

    let dest_display = dest.display().to_string();
    let writer = thread::spawn(move || write_stage(dest_file, filled_rx, free_tx));

    let mut buffer = vec![0u8; buffer_size];
    let mut pos: u64 = 0;
    let mut read_error: Option<CacheError> = None;

    while pos < total_len {
        let count = match source.read(&mut buffer) {
            Ok(0) => {
                read_error = Some(CacheError::SourceUnreadable(format!(
                    "stream ended after {pos} of {total_len} bytes"
                )));
                break;
            }
            Ok(n) => n,
            Err(e) => {
                read_error = Some(CacheError::SourceUnreadable(e.to_string()));
                break;
            }
        };

        // Hand the filled buffer to the writer; a hangup means the writer
        // already failed and its error is picked up on join
        if filled_tx.send((buffer, count)).is_err() {
            break;
        }
        pos += count as u64;
        progress.report(pos);

        // Take ownership of the drained buffer for the next read
        buffer = match free_rx.recv() {
            Ok(b) => b,
            Err(_) => break,
        };
    }

    // Dropping the sender is the completion/cancellation signal: the writer
    // drains anything already ready, then stops and closes the file
    drop(filled_tx);

    let written = match writer.join() {
        Ok(Ok(written)) => written,
        Ok(Err(e)) => {
            warn!(dest = %dest_display, error = %e, "Write stage failed, partial file left in place");
            return Err(read_error.unwrap_or(CacheError::Write {
                path: dest_display,
                source: e,
            }));
        }
        Err(_) => {
            return Err(CacheError::Write {
                path: dest_display,
                source: io::Error::other("write stage panicked"),
            })
        }
    };

    if let Some(e) = read_error {
        warn!(dest = %dest_display, error = %e, "Read stage failed, partial file left in place");
        return Err(e);
    }

    info!(dest = %dest_display, bytes = written, "Stream copy complete");
    Ok(written)
}

/// Writer thread: drain ready buffers into the destination file
///
/// Owns the destination handle exclusively; the file is closed on every
/// exit path when the handle drops.
fn write_stage(
    mut dest: File,
    filled_rx: mpsc::Receiver<(Vec<u8>, usize)>,
    free_tx: mpsc::SyncSender<Vec<u8>>,
) -> io::Result<u64> {
    let mut written: u64 = 0;
    while let Ok((buffer, count)) = filled_rx.recv() {
        dest.write_all(&buffer[..count])?;
        written += count as u64;
        // Reader gone means completion or a read-side failure; stop either way
        if free_tx.send(buffer).is_err() {
            break;
        }
    }
    dest.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that serves some bytes and then fails
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::other("simulated network failure"));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(0xAB);
            self.remaining -= n;
            Ok(n)
        }
    }

    fn copy_round_trip(len: usize, buffer_size: usize) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");

        let progress = ProgressReporter::new("out.bin", len as u64);
        let copied = run(
            &mut Cursor::new(data.clone()),
            len as u64,
            &dest,
            buffer_size,
            &progress,
        )
        .unwrap();

        assert_eq!(copied, len as u64);
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_round_trip_at_buffer_boundaries() {
        let buffer_size = 64;
        for len in [0, 1, 63, 64, 65, 64 * 3] {
            copy_round_trip(len, buffer_size);
        }
    }

    #[test]
    fn test_zero_length_creates_empty_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.bin");
        let progress = ProgressReporter::new("empty.bin", 0);
        let copied = run(&mut Cursor::new(vec![]), 0, &dest, 64, &progress).unwrap();
        assert_eq!(copied, 0);
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_read_failure_reports_error_and_leaves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("partial.bin");
        let progress = ProgressReporter::new("partial.bin", 1000);

        let mut reader = FailingReader { remaining: 100 };
        let result = run(&mut reader, 1000, &dest, 64, &progress);

        match result {
            Err(CacheError::SourceUnreadable(_)) => {}
            other => panic!("expected SourceUnreadable, got {other:?}"),
        }
        // Partial file stays on disk; its length is whatever was drained
        assert!(dest.exists());
        assert!(fs::metadata(&dest).unwrap().len() <= 100);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_write_failure_surfaces_as_write_error() {
        // /dev/full accepts the open but fails every write with ENOSPC
        let dest = Path::new("/dev/full");
        let progress = ProgressReporter::new("full.bin", 1000);

        let result = run(&mut Cursor::new(vec![9u8; 1000]), 1000, dest, 64, &progress);
        match result {
            Err(CacheError::Write { .. }) => {}
            other => panic!("expected Write error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_stream_is_unexpected_eof() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("short.bin");
        let progress = ProgressReporter::new("short.bin", 500);

        // Declares 500 bytes but only serves 100
        let result = run(&mut Cursor::new(vec![1u8; 100]), 500, &dest, 64, &progress);
        match result {
            Err(CacheError::SourceUnreadable(msg)) => {
                assert!(msg.contains("stream ended"), "unexpected message: {msg}")
            }
            other => panic!("expected SourceUnreadable, got {other:?}"),
        }
    }
}
