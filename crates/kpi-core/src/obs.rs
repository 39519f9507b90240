//! Structured observability hooks for the row and batch lifecycle.
//!
//! This module provides:
//! - Batch- and row-scoped tracing spans via RAII guards
//! - Emission functions for key events: row validated/finalized, batch
//!   started/finished, catalog loaded, submission row rejected
//!
//! Events are emitted at `info!` level, per-row events at `debug!`.
//! Filtering follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{debug, info, warn};

use crate::domain::RowStatus;
use crate::validator::ValidationSummary;

/// RAII guard that enters a batch-scoped span.
///
/// ```ignore
/// let _span = BatchSpan::enter("3fa1c0de9b12-250");
/// // every row span and event below carries batch_id
/// ```
pub struct BatchSpan {
    _span: tracing::span::EnteredSpan,
}

impl BatchSpan {
    pub fn enter(batch_id: &str) -> Self {
        let span = tracing::info_span!("kpi.batch", batch_id = %batch_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// RAII guard that enters a row-scoped span.
pub struct RowSpan {
    _span: tracing::span::EnteredSpan,
}

impl RowSpan {
    pub fn enter(row_id: i64) -> Self {
        let span = tracing::debug_span!("kpi.row", row_id = row_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Batch identifier: catalog digest prefix plus row count.
pub fn batch_id(catalog_digest: &str, rows: usize) -> String {
    let prefix = catalog_digest.get(..12).unwrap_or(catalog_digest);
    format!("{prefix}-{rows}")
}

pub fn emit_row_validated(summary: &ValidationSummary) {
    debug!(
        event = "row.validated",
        row_id = summary.row_id,
        blocking = summary.blocking,
        code_count = summary.code_count,
        invalid_text_fields = ?summary.invalid_text_fields,
    );
}

pub fn emit_row_finalized(row_id: i64, status: RowStatus, code_count: usize) {
    debug!(
        event = "row.finalized",
        row_id = row_id,
        status = ?status,
        code_count = code_count,
    );
}

pub fn emit_batch_started(batch_id: &str, rows: usize, parallel: bool) {
    info!(
        event = "batch.started",
        batch_id = %batch_id,
        rows = rows,
        parallel = parallel,
    );
}

/// Emit event: batch finished with per-status counts and duration.
pub fn emit_batch_finished(
    batch_id: &str,
    valid: usize,
    needs_review: usize,
    invalid: usize,
    duration_ms: u64,
) {
    info!(
        event = "batch.finished",
        batch_id = %batch_id,
        valid = valid,
        needs_review = needs_review,
        invalid = invalid,
        duration_ms = duration_ms,
    );
}

pub fn emit_catalog_loaded(digest: &str, templates: usize, buckets: usize) {
    info!(
        event = "catalog.loaded",
        digest = %digest,
        templates = templates,
        buckets = buckets,
    );
}

/// Emit event: a bulk row was rejected at the submission boundary (warning level).
pub fn emit_submission_rejected_row(index: usize, row_id: i64, error: &dyn std::fmt::Display) {
    warn!(
        event = "submission.rejected_row",
        index = index,
        row_id = row_id,
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_create() {
        let _batch = BatchSpan::enter("abc-1");
        let _row = RowSpan::enter(1);
    }

    #[test]
    fn test_batch_id_uses_digest_prefix() {
        assert_eq!(batch_id("0123456789abcdef", 3), "0123456789ab-3");
        assert_eq!(batch_id("short", 0), "short-0");
    }
}
