//! Global atomic counters for pipeline observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a batch).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::RowStatus;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters. No allocations, no locking.
pub struct Metrics {
    rows_processed: AtomicU64,
    rows_valid: AtomicU64,
    rows_needs_review: AtomicU64,
    rows_invalid: AtomicU64,
    metrics_auto_filled: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            rows_processed: AtomicU64::new(0),
            rows_valid: AtomicU64::new(0),
            rows_needs_review: AtomicU64::new(0),
            rows_invalid: AtomicU64::new(0),
            metrics_auto_filled: AtomicU64::new(0),
        }
    }

    /// Count one finished row under its status.
    pub fn record_row(&self, status: RowStatus, auto_filled: bool) {
        self.rows_processed.fetch_add(1, Ordering::Relaxed);
        let counter = match status {
            RowStatus::Valid => &self.rows_valid,
            RowStatus::NeedsReview => &self.rows_needs_review,
            RowStatus::Invalid => &self.rows_invalid,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if auto_filled {
            self.metrics_auto_filled.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "rows_processed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a batch) rather than on
    /// every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            rows_processed = self.rows_processed(),
            rows_valid = self.rows_valid(),
            rows_needs_review = self.rows_needs_review(),
            rows_invalid = self.rows_invalid(),
            metrics_auto_filled = self.metrics_auto_filled(),
        );
    }

    pub fn rows_processed(&self) -> u64 {
        self.rows_processed.load(Ordering::Relaxed)
    }

    pub fn rows_valid(&self) -> u64 {
        self.rows_valid.load(Ordering::Relaxed)
    }

    pub fn rows_needs_review(&self) -> u64 {
        self.rows_needs_review.load(Ordering::Relaxed)
    }

    pub fn rows_invalid(&self) -> u64 {
        self.rows_invalid.load(Ordering::Relaxed)
    }

    pub fn metrics_auto_filled(&self) -> u64 {
        self.metrics_auto_filled.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.rows_processed.store(0, Ordering::Relaxed);
        self.rows_valid.store(0, Ordering::Relaxed);
        self.rows_needs_review.store(0, Ordering::Relaxed);
        self.rows_invalid.store(0, Ordering::Relaxed);
        self.metrics_auto_filled.store(0, Ordering::Relaxed);
    }
}
