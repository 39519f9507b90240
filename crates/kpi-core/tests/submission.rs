use std::sync::Arc;

use kpi_core::{
    process_submission, process_submission_parallel, ErrorCode, KpiError, PipelineConfig,
    PipelineContext, RowStatus, Submission, SubmissionError,
};
use serde_json::json;

fn make_context(max_rows: usize) -> PipelineContext {
    let mut config = PipelineConfig::default().with_reference_year(2025);
    config.max_batch_rows = max_rows;
    PipelineContext::with_builtin_catalog(config).unwrap()
}

fn good_row(row_id: i64) -> serde_json::Value {
    json!({
        "row_id": row_id,
        "team_role": "Content",
        "task_type": "Research",
        "task_name": "Audience survey",
        "dead_line": "12 Aug 2025",
        "strategic_benefit": "Sharpen editorial focus",
        "output_metric": "survey report",
        "quality_metric": "300 responses",
        "improvement_metric": "10% increase in engagement"
    })
}

// ── Single ──────────────────────────────────────────────────────────────

#[test]
fn single_submission_processes_one_row() {
    let ctx = make_context(10);
    let submission = Submission::from_value(json!({"kind": "single", "row": good_row(4)})).unwrap();
    let report = process_submission(&ctx, submission).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].row_id(), 4);
    assert_eq!(report.rows[0].status(), RowStatus::Valid);
}

#[test]
fn malformed_single_row_is_e601() {
    let ctx = make_context(10);
    let submission =
        Submission::from_value(json!({"kind": "single", "row": {"row_id": "seven"}})).unwrap();
    let report = process_submission(&ctx, submission).unwrap();
    assert_eq!(report.rows[0].error_codes(), &[ErrorCode::MalformedRow]);
    assert_eq!(report.rows[0].row_id(), 0);
}

// ── Bulk ────────────────────────────────────────────────────────────────

#[test]
fn bad_bulk_row_does_not_fail_batch() {
    let ctx = make_context(10);
    let submission = Submission::from_value(json!({
        "kind": "bulk",
        "rows": [good_row(1), {"row_id": 2, "owner": "sam"}, good_row(3)]
    }))
    .unwrap();
    let report = process_submission(&ctx, submission).unwrap();
    let ids: Vec<i64> = report.rows.iter().map(|r| r.row_id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(report.rows[1].status(), RowStatus::Invalid);
    assert_eq!(report.rows[1].error_codes(), &[ErrorCode::MalformedRow]);
    assert_eq!(report.summary.code_histogram.get("E601"), Some(&1));
    assert_eq!(report.summary.valid, 2);
}

#[test]
fn oversized_bulk_is_rejected_whole() {
    let ctx = make_context(2);
    let submission = Submission::from_value(json!([good_row(1), good_row(2), good_row(3)])).unwrap();
    let err = process_submission(&ctx, submission).unwrap_err();
    assert!(matches!(
        err,
        KpiError::Submission(SubmissionError::TooLarge { rows: 3, limit: 2 })
    ));
    assert!(err.to_string().contains("E602"));
}

#[test]
fn unknown_envelope_field_is_rejected() {
    let err = Submission::from_value(json!({"kind": "bulk", "rows": [], "priority": 1})).unwrap_err();
    assert!(matches!(err, SubmissionError::Shape(_)));
}

#[tokio::test]
async fn parallel_submission_matches_sequential() {
    let ctx = Arc::new(make_context(100));
    let rows: Vec<_> = (0..12)
        .map(|i| if i == 5 { json!({"row_id": i, "dead_line": 20250101}) } else { good_row(i) })
        .collect();
    let sequential =
        process_submission(&ctx, Submission::Bulk { rows: rows.clone() }).unwrap();
    let parallel = process_submission_parallel(Arc::clone(&ctx), Submission::Bulk { rows })
        .await
        .unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(parallel.rows[5].error_codes(), &[ErrorCode::MalformedRow]);
}
