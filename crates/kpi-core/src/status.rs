//! Final status assembly.
//!
//! Status is derived from the combination of validation and metrics
//! outcomes, never from a single code:
//!
//! - INVALID: blocking validation, or wrong year under the strict policy
//! - NEEDS_REVIEW: metrics auto-filled, mode fell back, or wrong year under
//!   the lenient policy
//! - VALID: otherwise

use crate::config::{PipelineConfig, YearPolicy};
use crate::domain::{FinalRow, RowStatus};
use crate::objective::GeneratedRow;
use crate::resolver::MetricsOutcome;
use crate::validator::ValidationOutcome;

pub const VALID_COMMENT: &str = "All criteria met.";
pub const INVALID_SUMMARY: &str =
    "Row rejected: required information is missing, invalid or unsafe. See error codes.";
pub const NEEDS_REVIEW_SUMMARY: &str = "Objective generated but needs review before approval.";
pub const ALL_METRICS_NOTE: &str =
    "All three metrics were suggested from the role and task type; confirm they fit.";
pub const PARTIAL_METRICS_NOTE: &str =
    "Missing metrics were suggested from the role and task type; confirm they fit.";
pub const MODE_NOTE: &str = "Unrecognized mode; defaulted to both.";
pub const YEAR_NOTE: &str = "Deadline falls outside the reference year.";

pub fn decide_status(
    validation: &ValidationOutcome,
    metrics: &MetricsOutcome,
    policy: YearPolicy,
) -> RowStatus {
    let wrong_year = validation.wrong_year();
    if validation.blocking || (wrong_year && policy == YearPolicy::Strict) {
        RowStatus::Invalid
    } else if metrics.was_auto_filled() || validation.mode_hint.fell_back || wrong_year {
        RowStatus::NeedsReview
    } else {
        RowStatus::Valid
    }
}

fn comments(status: RowStatus, validation: &ValidationOutcome, metrics: &MetricsOutcome) -> String {
    match status {
        RowStatus::Valid => VALID_COMMENT.to_string(),
        RowStatus::Invalid => INVALID_SUMMARY.to_string(),
        RowStatus::NeedsReview => {
            let mut parts = vec![NEEDS_REVIEW_SUMMARY];
            match metrics.auto_filled_count() {
                0 => {}
                3 => parts.push(ALL_METRICS_NOTE),
                _ => parts.push(PARTIAL_METRICS_NOTE),
            }
            if validation.mode_hint.fell_back {
                parts.push(MODE_NOTE);
            }
            if validation.wrong_year() {
                parts.push(YEAR_NOTE);
            }
            parts.join(" ")
        }
    }
}

/// Merge a generated row into its terminal form.
///
/// INVALID rows always carry an empty objective, whatever was generated.
pub fn assemble(generated: GeneratedRow, config: &PipelineConfig) -> FinalRow {
    let GeneratedRow { row, objectives } = generated;
    let status = decide_status(&row.validation, &row.metrics, config.year_policy);

    let mut codes = row.validation.codes.clone();
    if let Some(code) = row.metrics.code() {
        codes.push(code);
    }

    let (objective, objective_mode) = match status {
        RowStatus::Invalid => (String::new(), None),
        _ => match objectives.preferred(config.both_mode_preference) {
            Some((mode, text)) => (text.to_string(), Some(mode)),
            None => (String::new(), None),
        },
    };

    FinalRow::new(
        row.validation.normalized.row_id,
        objective,
        objective_mode,
        status,
        comments(status, &row.validation, &row.metrics),
        codes.sorted(),
        row.metrics.metrics.clone(),
        row.metrics.was_auto_filled(),
        row.variation_seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CodeSet, Mode, NormalizedRow, ResolvedMetrics};
    use crate::normalize::ModeHint;

    fn validation(blocking: bool) -> ValidationOutcome {
        ValidationOutcome {
            normalized: NormalizedRow {
                row_id: 1,
                task_name: "X".into(),
                task_type_label: "Project".into(),
                task_type: None,
                team_role_label: "Design".into(),
                team_role: None,
                deadline: None,
                strategic_benefit: "grow".into(),
                company: None,
                output_metric: None,
                quality_metric: None,
                improvement_metric: None,
                rejected_metrics: [false; 3],
                mode: Mode::Both,
            },
            missing_fields: Vec::new(),
            invalid_fields: Vec::new(),
            invalid_text_fields: Vec::new(),
            deadline: None,
            mode_hint: ModeHint {
                mode: Mode::Both,
                fell_back: false,
            },
            codes: CodeSet::new(),
            blocking,
        }
    }

    fn metrics(filled: [bool; 3]) -> MetricsOutcome {
        MetricsOutcome {
            metrics: ResolvedMetrics::default(),
            auto_filled: filled,
            source: None,
        }
    }

    #[test]
    fn test_blocking_wins_over_metrics() {
        let status = decide_status(&validation(true), &metrics([true; 3]), YearPolicy::Strict);
        assert_eq!(status, RowStatus::Invalid);
    }

    #[test]
    fn test_autofill_only_reaches_needs_review() {
        let status = decide_status(&validation(false), &metrics([true, false, false]), YearPolicy::Strict);
        assert_eq!(status, RowStatus::NeedsReview);
        let status = decide_status(&validation(false), &metrics([false; 3]), YearPolicy::Strict);
        assert_eq!(status, RowStatus::Valid);
    }

    #[test]
    fn test_mode_fallback_is_review() {
        let mut v = validation(false);
        v.mode_hint.fell_back = true;
        assert_eq!(
            decide_status(&v, &metrics([false; 3]), YearPolicy::Strict),
            RowStatus::NeedsReview
        );
        assert_eq!(
            comments(RowStatus::NeedsReview, &v, &metrics([false; 3])),
            format!("{NEEDS_REVIEW_SUMMARY} {MODE_NOTE}")
        );
    }

    #[test]
    fn test_needs_review_comment_mentions_metrics() {
        let v = validation(false);
        let text = comments(RowStatus::NeedsReview, &v, &metrics([true; 3]));
        assert!(text.starts_with(NEEDS_REVIEW_SUMMARY));
        assert!(text.contains(ALL_METRICS_NOTE));
    }
}
