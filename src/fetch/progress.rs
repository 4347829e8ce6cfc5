//! Download progress (bytes done, rate, ETA) and its log reporting.

use std::time::Instant;

/// Report every 10% when the total size is known.
const PERCENT_STEP: u64 = 10;
/// Report every MiB when the total size is unknown.
const UNKNOWN_STEP_BYTES: u64 = 1024 * 1024;

/// Snapshot of download progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes received so far.
    pub bytes_done: u64,
    /// Total size in bytes, when the server announced it.
    pub total_bytes: Option<u64>,
    /// Elapsed time since the transfer started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Fraction complete in [0.0, 1.0]; None when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            None => None,
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
        }
    }

    /// Estimated seconds remaining (None if the total is unknown or the rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let total = self.total_bytes?;
        let remaining = total.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}

/// Turns raw (done, total) callbacks into throttled `tracing` progress events.
pub struct ProgressLogger {
    label: String,
    started: Instant,
    enabled: bool,
    next_mark: u64,
}

impl ProgressLogger {
    pub fn new(label: impl Into<String>, enabled: bool) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
            enabled,
            next_mark: 0,
        }
    }

    pub fn stats(&self, bytes_done: u64, total_bytes: Option<u64>) -> ProgressStats {
        ProgressStats {
            bytes_done,
            total_bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    /// Record an update; returns true when it crossed a reporting mark and was logged.
    pub fn update(&mut self, bytes_done: u64, total_bytes: Option<u64>) -> bool {
        if !self.enabled || bytes_done == 0 {
            return false;
        }
        let mark = match total_bytes.filter(|t| *t > 0) {
            Some(total) => bytes_done.min(total) * 100 / total / PERCENT_STEP,
            None => bytes_done / UNKNOWN_STEP_BYTES,
        };
        if mark < self.next_mark {
            return false;
        }
        self.next_mark = mark + 1;
        let stats = self.stats(bytes_done, total_bytes);
        match stats.fraction() {
            Some(f) => tracing::info!(
                "{}: {:.0}% ({} bytes, {:.0} B/s)",
                self.label,
                f * 100.0,
                stats.bytes_done,
                stats.bytes_per_sec()
            ),
            None => tracing::info!(
                "{}: {} bytes ({:.0} B/s)",
                self.label,
                stats.bytes_done,
                stats.bytes_per_sec()
            ),
        }
        true
    }
}
