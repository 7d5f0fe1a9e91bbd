//! Transfer Progress Reporting
//!
//! Observational progress lines for the copy pipeline and the pseudo-cache
//! read-through. Never affects control flow.

use std::time::Instant;

use tracing::info;

const MB: f64 = 1024.0 * 1024.0;

/// Emits percent-complete / throughput / ETA lines for one transfer
pub struct ProgressReporter {
    display_name: String,
    total_bytes: u64,
    started: Instant,
}

impl ProgressReporter {
    /// `base_name` is the source's base file name; the display string also
    /// carries the total size, e.g. `video.mp4 (12.34 MB)`
    pub fn new(base_name: &str, total_bytes: u64) -> Self {
        Self {
            display_name: format!("{} ({:.2} MB)", base_name, total_bytes as f64 / MB),
            total_bytes,
            started: Instant::now(),
        }
    }

    /// Report progress after a completed buffer handoff
    pub fn report(&self, bytes_so_far: u64) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            bytes_so_far as f64 / elapsed
        } else {
            0.0
        };
        let percent = if self.total_bytes > 0 {
            bytes_so_far as f64 / self.total_bytes as f64 * 100.0
        } else {
            100.0
        };
        let remaining_secs = if rate > 0.0 {
            self.total_bytes.saturating_sub(bytes_so_far) as f64 / rate
        } else {
            0.0
        };

        info!(
            file = %self.display_name,
            percent = percent,
            read_mb = bytes_so_far as f64 / MB,
            rate_mb_s = rate / MB,
            eta_s = remaining_secs,
            "Preloading"
        );
    }
}
