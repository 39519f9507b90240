//! Batch processing, sequential or across blocking worker tasks.
//!
//! Rows are independent, so the parallel runner splits them into chunks,
//! processes each chunk on `spawn_blocking`, and reassembles the results in
//! input order. Both runners produce identical output for identical input.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::domain::{FinalRow, KpiError, RawRow, Result, RowStatus};
use crate::metrics::METRICS;
use crate::obs;
use crate::pipeline::PipelineContext;

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub needs_review: usize,
    pub invalid: usize,
    pub auto_suggested: usize,
    /// Rows carrying each code, keyed by the code string.
    pub code_histogram: BTreeMap<String, usize>,
    pub catalog_digest: String,
}

impl BatchSummary {
    pub fn from_rows(rows: &[FinalRow], catalog_digest: &str) -> Self {
        let mut summary = Self {
            total: rows.len(),
            catalog_digest: catalog_digest.to_string(),
            ..Self::default()
        };
        for row in rows {
            match row.status() {
                RowStatus::Valid => summary.valid += 1,
                RowStatus::NeedsReview => summary.needs_review += 1,
                RowStatus::Invalid => summary.invalid += 1,
            }
            if row.metrics_auto_suggested() {
                summary.auto_suggested += 1;
            }
            for code in row.error_codes() {
                *summary.code_histogram.entry(code.to_string()).or_insert(0) += 1;
            }
        }
        summary
    }
}

/// Finished rows in input order plus their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub rows: Vec<FinalRow>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(rows: Vec<FinalRow>, catalog_digest: &str) -> Self {
        let summary = BatchSummary::from_rows(&rows, catalog_digest);
        Self { rows, summary }
    }
}

/// Process rows one after another on the current thread.
pub fn process_batch(ctx: &PipelineContext, rows: &[RawRow]) -> BatchReport {
    let digest = ctx.catalog().digest();
    let batch_id = obs::batch_id(digest, rows.len());
    let _span = obs::BatchSpan::enter(&batch_id);
    obs::emit_batch_started(&batch_id, rows.len(), false);
    let started = Instant::now();

    let finished: Vec<FinalRow> = rows.iter().map(|row| ctx.process_row(row)).collect();

    finish(&batch_id, finished, digest, started)
}

/// Process rows in chunks of `chunk_size` on tokio's blocking pool.
///
/// A `chunk_size` of zero falls back to the configured chunk size.
pub async fn process_batch_parallel(
    ctx: Arc<PipelineContext>,
    rows: Vec<RawRow>,
    chunk_size: usize,
) -> Result<BatchReport> {
    let chunk_size = if chunk_size == 0 {
        ctx.config().parallel_chunk_size
    } else {
        chunk_size
    };
    let digest = ctx.catalog().digest().to_string();
    let batch_id = obs::batch_id(&digest, rows.len());
    obs::emit_batch_started(&batch_id, rows.len(), true);
    let started = Instant::now();

    let chunks: Vec<Vec<RawRow>> = rows.chunks(chunk_size).map(<[RawRow]>::to_vec).collect();
    let chunk_count = chunks.len();

    let mut join_set = JoinSet::new();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let batch_id = batch_id.clone();
        join_set.spawn_blocking(move || {
            let _span = obs::BatchSpan::enter(&batch_id);
            let finished: Vec<FinalRow> = chunk.iter().map(|row| ctx.process_row(row)).collect();
            (idx, finished)
        });
    }

    let mut ordered: Vec<Option<Vec<FinalRow>>> = vec![None; chunk_count];
    while let Some(joined) = join_set.join_next().await {
        let (idx, finished) =
            joined.map_err(|e| KpiError::Worker(format!("batch chunk join error: {e}")))?;
        ordered[idx] = Some(finished);
    }

    let mut finished = Vec::with_capacity(rows.len());
    for (idx, slot) in ordered.into_iter().enumerate() {
        let chunk = slot.ok_or_else(|| KpiError::Worker(format!("missing result for chunk {idx}")))?;
        finished.extend(chunk);
    }

    Ok(finish(&batch_id, finished, &digest, started))
}

fn finish(batch_id: &str, rows: Vec<FinalRow>, digest: &str, started: Instant) -> BatchReport {
    let report = BatchReport::new(rows, digest);
    obs::emit_batch_finished(
        batch_id,
        report.summary.valid,
        report.summary.needs_review,
        report.summary.invalid,
        started.elapsed().as_millis() as u64,
    );
    METRICS.flush();
    report
}
