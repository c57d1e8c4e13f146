// Progress tracking
//
// Counters and ETA for one sequential batch. Only the orchestrator holds the
// tracker, so plain fields are enough.

use crate::models::{ConversionOutcome, FailureReason};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Running counters of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Files found by discovery
    pub total: usize,

    /// Files with a recorded outcome
    pub processed: usize,

    pub succeeded: usize,

    /// Files skipped because of an unsupported model version
    pub skipped: usize,

    pub failed: usize,

    /// Temp directories that could not be removed after success
    pub cleanup_warnings: usize,
}

impl BatchStats {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            cleanup_warnings: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }
}

/// Accumulates outcomes and estimates the remaining time.
///
/// Updated exactly once per file, after its outcome is known.
#[derive(Debug)]
pub struct ProgressTracker {
    stats: BatchStats,
    failures: IndexMap<Utf8PathBuf, FailureReason>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::started_at(total, Instant::now())
    }

    /// Tracker whose clock started at `start_time`
    pub fn started_at(total: usize, start_time: Instant) -> Self {
        Self {
            stats: BatchStats::new(total),
            failures: IndexMap::new(),
            start_time,
        }
    }

    /// Record the outcome of one file
    pub fn record(&mut self, relative: &Utf8Path, outcome: &ConversionOutcome) {
        self.stats.processed += 1;
        match outcome {
            ConversionOutcome::Succeeded => self.stats.succeeded += 1,
            ConversionOutcome::SkippedUnsupportedModel => self.stats.skipped += 1,
            ConversionOutcome::Failed(reason) => {
                self.stats.failed += 1;
                self.failures.insert(relative.to_path_buf(), reason.clone());
            }
        }
    }

    pub fn record_cleanup_warning(&mut self) {
        self.stats.cleanup_warnings += 1;
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Estimated time left, `None` until at least one file completed
    pub fn estimate_remaining(&self) -> Option<Duration> {
        self.estimate_remaining_after(self.elapsed())
    }

    /// `remaining / (processed / elapsed)` for a given elapsed time
    pub fn estimate_remaining_after(&self, elapsed: Duration) -> Option<Duration> {
        if self.stats.processed == 0 {
            return None;
        }
        let per_item = elapsed.as_secs_f64() / self.stats.processed as f64;
        Some(Duration::from_secs_f64(per_item * self.stats.remaining() as f64))
    }

    pub fn percent_complete(&self) -> f64 {
        if self.stats.total == 0 {
            100.0
        } else {
            self.stats.processed as f64 / self.stats.total as f64 * 100.0
        }
    }

    /// Log the progress line after a file completes
    pub fn log_progress(&self) {
        if self.stats.remaining() == 0 {
            return;
        }
        let eta = self
            .estimate_remaining()
            .map(format_duration)
            .unwrap_or_else(|| "unknown".to_string());

        tracing::info!(
            "Progress: {}/{} files processed ({:.1}%). ETA: {}",
            self.stats.processed,
            self.stats.total,
            self.percent_complete(),
            eta
        );
    }

    pub fn into_summary(self, interrupted: bool) -> BatchSummary {
        BatchSummary {
            elapsed: self.elapsed(),
            stats: self.stats,
            interrupted,
            failures: self.failures,
        }
    }
}

/// Final report of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    #[serde(flatten)]
    pub stats: BatchStats,

    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,

    /// Stopped by an interrupt before every file was processed
    pub interrupted: bool,

    /// Failed files in processing order
    pub failures: IndexMap<Utf8PathBuf, FailureReason>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.stats.total
    }

    pub fn processed(&self) -> usize {
        self.stats.processed
    }

    pub fn succeeded(&self) -> usize {
        self.stats.succeeded
    }

    pub fn skipped(&self) -> usize {
        self.stats.skipped
    }

    pub fn failed(&self) -> usize {
        self.stats.failed
    }

    pub fn log(&self) {
        tracing::info!("{}", "-".repeat(70));
        if self.interrupted {
            tracing::warn!(
                "Conversion interrupted after {}/{} files",
                self.stats.processed,
                self.stats.total
            );
        }
        tracing::info!(
            "Files: {} total, {} processed, {} succeeded, {} skipped (unsupported model), {} failed",
            self.stats.total,
            self.stats.processed,
            self.stats.succeeded,
            self.stats.skipped,
            self.stats.failed
        );
        if self.stats.cleanup_warnings > 0 {
            tracing::warn!(
                "{} extract folders could not be removed",
                self.stats.cleanup_warnings
            );
        }
        for (path, reason) in &self.failures {
            tracing::error!("Failed: {} ({})", path, reason.kind);
        }
        tracing::info!(
            "Conversion process completed. Total time: {}",
            format_duration(self.elapsed)
        );
    }
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Human-readable duration: `45s`, `1m 23s`, `2h 05m 09s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
