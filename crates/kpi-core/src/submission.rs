//! Submission boundary.
//!
//! Requests are tagged by `kind`:
//!
//! ```json
//! {"kind": "single", "row": {"row_id": 1, "task_name": "..."}}
//! {"kind": "bulk", "rows": [{"row_id": 1}, {"row_id": 2}]}
//! ```
//!
//! A bare JSON array is accepted as shorthand for a bulk submission. Rows
//! are kept as raw JSON until admission so that one malformed row becomes
//! an E601 result instead of failing the whole request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::{process_batch, process_batch_parallel, BatchReport};
use crate::domain::{
    ErrorCode, FinalRow, RawRow, ResolvedMetrics, Result, RowStatus, SubmissionError,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::pipeline::PipelineContext;

pub const MALFORMED_ROW_COMMENT: &str =
    "Row could not be read: unexpected or mistyped fields. See error codes.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Submission {
    Single { row: Value },
    Bulk { rows: Vec<Value> },
}

/// A row after the shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted(RawRow),
    Rejected(FinalRow),
}

impl Submission {
    pub fn from_json(text: &str) -> std::result::Result<Self, SubmissionError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, SubmissionError> {
        match value {
            Value::Array(rows) => Ok(Self::Bulk { rows }),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Bulk { rows } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape-check every row. Bulk submissions over `max_rows` are refused
    /// as a whole.
    pub fn admit(self, max_rows: usize) -> std::result::Result<Vec<Admission>, SubmissionError> {
        let rows = match self {
            Self::Single { row } => vec![row],
            Self::Bulk { rows } => {
                if rows.len() > max_rows {
                    return Err(SubmissionError::TooLarge {
                        rows: rows.len(),
                        limit: max_rows,
                    });
                }
                rows
            }
        };
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, value)| admit_row(index, value))
            .collect())
    }
}

fn admit_row(index: usize, value: Value) -> Admission {
    let row_id = value
        .get("row_id")
        .and_then(Value::as_i64)
        .unwrap_or(index as i64);
    match serde_json::from_value::<RawRow>(value) {
        Ok(row) => Admission::Accepted(row),
        Err(e) => {
            obs::emit_submission_rejected_row(index, row_id, &e);
            Admission::Rejected(malformed_row(row_id))
        }
    }
}

/// Terminal result for a row that failed the shape check.
pub fn malformed_row(row_id: i64) -> FinalRow {
    METRICS.record_row(RowStatus::Invalid, false);
    FinalRow::new(
        row_id,
        String::new(),
        None,
        RowStatus::Invalid,
        MALFORMED_ROW_COMMENT.to_string(),
        vec![ErrorCode::MalformedRow],
        ResolvedMetrics::default(),
        false,
        0,
    )
}

/// Split admissions into accepted rows and rejected results with their
/// positions.
fn partition(admissions: Vec<Admission>) -> (Vec<RawRow>, Vec<(usize, FinalRow)>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (index, admission) in admissions.into_iter().enumerate() {
        match admission {
            Admission::Accepted(row) => accepted.push(row),
            Admission::Rejected(row) => rejected.push((index, row)),
        }
    }
    (accepted, rejected)
}

/// Put rejected rows back at their original positions.
fn merge(processed: Vec<FinalRow>, rejected: Vec<(usize, FinalRow)>) -> Vec<FinalRow> {
    let total = processed.len() + rejected.len();
    let mut processed = processed.into_iter();
    let mut rejected = rejected.into_iter().peekable();
    let mut out = Vec::with_capacity(total);
    for index in 0..total {
        match rejected.next_if(|(i, _)| *i == index) {
            Some((_, row)) => out.push(row),
            None => out.extend(processed.next()),
        }
    }
    out
}

/// Admit and process a submission on the current thread.
pub fn process_submission(ctx: &PipelineContext, submission: Submission) -> Result<BatchReport> {
    let admissions = submission.admit(ctx.config().max_batch_rows)?;
    let (accepted, rejected) = partition(admissions);
    let report = process_batch(ctx, &accepted);
    Ok(BatchReport::new(
        merge(report.rows, rejected),
        ctx.catalog().digest(),
    ))
}

/// Admit and process a submission on tokio's blocking pool.
pub async fn process_submission_parallel(
    ctx: Arc<PipelineContext>,
    submission: Submission,
) -> Result<BatchReport> {
    let admissions = submission.admit(ctx.config().max_batch_rows)?;
    let (accepted, rejected) = partition(admissions);
    let chunk_size = ctx.config().parallel_chunk_size;
    let report = process_batch_parallel(Arc::clone(&ctx), accepted, chunk_size).await?;
    Ok(BatchReport::new(
        merge(report.rows, rejected),
        ctx.catalog().digest(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_shapes() {
        let single = Submission::from_json(r#"{"kind":"single","row":{"row_id":1}}"#).unwrap();
        assert_eq!(single.len(), 1);
        let bulk = Submission::from_json(r#"{"kind":"bulk","rows":[{"row_id":1},{"row_id":2}]}"#)
            .unwrap();
        assert_eq!(bulk.len(), 2);
        let bare = Submission::from_json(r#"[{"row_id":1}]"#).unwrap();
        assert!(matches!(bare, Submission::Bulk { .. }));
    }

    #[test]
    fn test_unknown_kind_is_shape_error() {
        let err = Submission::from_json(r#"{"kind":"stream","rows":[]}"#).unwrap_err();
        assert!(matches!(err, SubmissionError::Shape(_)));
    }

    #[test]
    fn test_too_large() {
        let submission = Submission::Bulk {
            rows: vec![json!({"row_id": 1}); 3],
        };
        let err = submission.admit(2).unwrap_err();
        assert!(matches!(err, SubmissionError::TooLarge { rows: 3, limit: 2 }));
    }

    #[test]
    fn test_malformed_row_recovers_id() {
        let submission = Submission::Bulk {
            rows: vec![
                json!({"row_id": 10, "task_name": "Ok"}),
                json!({"row_id": 11, "priority": "high"}),
                json!({"task_name": 5}),
            ],
        };
        let admitted = submission.admit(10).unwrap();
        assert!(matches!(admitted[0], Admission::Accepted(_)));
        match &admitted[1] {
            Admission::Rejected(row) => {
                assert_eq!(row.row_id(), 11);
                assert_eq!(row.error_codes(), &[ErrorCode::MalformedRow]);
                assert_eq!(row.objective(), "");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        match &admitted[2] {
            Admission::Rejected(row) => assert_eq!(row.row_id(), 2),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_restores_positions() {
        let a = malformed_row(100);
        let b = malformed_row(101);
        let c = malformed_row(102);
        let merged = merge(vec![a.clone(), c.clone()], vec![(1, b.clone())]);
        assert_eq!(merged, vec![a, b, c]);
    }
}
