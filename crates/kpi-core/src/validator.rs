//! Domain validation of a single row.
//!
//! Fields are visited in a fixed order (task name, task type, team role,
//! strategic benefit, company, metrics, deadline, mode) so code emission
//! order is deterministic. Problems accumulate; validation never fails.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::deadline::{DeadlineFailure, DeadlineParser, DeadlineResult};
use crate::domain::{CodeSet, ErrorCode, FieldName, NormalizedRow, RawRow};
use crate::normalize::{
    normalize_mode, normalize_task_type, normalize_team_role, ModeHint, TaskTypeMatch,
};
use crate::sanitizer::{Sanitizer, TextVerdict};

/// Structured result of validating one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Canonical view. Flagged text fields are blanked.
    pub normalized: NormalizedRow,
    pub missing_fields: Vec<FieldName>,
    /// Enum fields that failed normalization, and a malformed deadline.
    pub invalid_fields: Vec<FieldName>,
    /// Dangerous or low-signal text fields, in canonical order.
    pub invalid_text_fields: Vec<FieldName>,
    /// `None` when the deadline is missing.
    pub deadline: Option<DeadlineResult>,
    pub mode_hint: ModeHint,
    pub codes: CodeSet,
    /// Wrong year alone is not blocking here.
    pub blocking: bool,
}

impl ValidationOutcome {
    pub fn wrong_year(&self) -> bool {
        self.deadline.is_some_and(|d| d.valid && d.wrong_year)
    }
}

/// Compact per-row summary, used for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub row_id: i64,
    pub blocking: bool,
    pub code_count: usize,
    pub invalid_text_fields: Vec<FieldName>,
}

impl From<&ValidationOutcome> for ValidationSummary {
    fn from(outcome: &ValidationOutcome) -> Self {
        Self {
            row_id: outcome.normalized.row_id,
            blocking: outcome.blocking,
            code_count: outcome.codes.in_emission_order().len(),
            invalid_text_fields: outcome.invalid_text_fields.clone(),
        }
    }
}

/// Orchestrates the sanitizer, deadline parser and field normalizer.
#[derive(Debug, Clone)]
pub struct DomainValidator {
    sanitizer: Sanitizer,
    deadlines: DeadlineParser,
}

impl DomainValidator {
    pub fn new(config: &PipelineConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            sanitizer: Sanitizer::new(
                &config.effective_deny_substrings(),
                &config.effective_low_signal_values(),
            )?,
            deadlines: DeadlineParser::new()?,
        })
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn deadline_parser(&self) -> &DeadlineParser {
        &self.deadlines
    }

    pub fn validate(&self, row: &RawRow, reference_year: i32) -> ValidationOutcome {
        let mut codes = CodeSet::new();
        let mut missing_fields = Vec::new();
        let mut invalid_fields = Vec::new();
        let mut invalid_text_fields = Vec::new();

        // task name
        let task_name = match present(&row.task_name) {
            None => {
                codes.push(ErrorCode::MissingTaskName);
                missing_fields.push(FieldName::TaskName);
                String::new()
            }
            Some(name) => {
                if self.sanitizer.screen_into(&name, &mut codes).is_flagged() {
                    codes.push(ErrorCode::UnsafeTaskName);
                    invalid_text_fields.push(FieldName::TaskName);
                    String::new()
                } else {
                    name
                }
            }
        };

        // task type
        let (task_type_label, task_type) = match present(&row.task_type) {
            None => {
                codes.push(ErrorCode::MissingTaskType);
                missing_fields.push(FieldName::TaskType);
                (String::new(), None)
            }
            Some(value) => match normalize_task_type(&value) {
                TaskTypeMatch::Allowed(t) => (t.label().to_string(), Some(t)),
                TaskTypeMatch::NotAllowed(original) => {
                    codes.push(ErrorCode::InvalidTaskType);
                    invalid_fields.push(FieldName::TaskType);
                    (original, None)
                }
            },
        };

        // team role
        let (team_role_label, team_role) = match present(&row.team_role) {
            None => {
                codes.push(ErrorCode::MissingTeamRole);
                missing_fields.push(FieldName::TeamRole);
                (String::new(), None)
            }
            Some(value) => match normalize_team_role(&value) {
                Some(role) => (role.label(), Some(role)),
                None => {
                    codes.push(ErrorCode::InvalidTeamRole);
                    invalid_fields.push(FieldName::TeamRole);
                    (value, None)
                }
            },
        };

        // strategic benefit
        let strategic_benefit = match present(&row.strategic_benefit) {
            None => {
                codes.push(ErrorCode::MissingStrategicBenefit);
                missing_fields.push(FieldName::StrategicBenefit);
                String::new()
            }
            Some(text) => self
                .screen_optional(
                    Some(text),
                    FieldName::StrategicBenefit,
                    &mut codes,
                    &mut invalid_text_fields,
                )
                .unwrap_or_default(),
        };

        // company and metrics are optional; blanks are not screened
        let company = self.screen_optional(
            present(&row.company),
            FieldName::Company,
            &mut codes,
            &mut invalid_text_fields,
        );
        // a supplied metric that fails screening is rejected, not missing
        let screened = [
            (&row.output_metric, FieldName::OutputMetric),
            (&row.quality_metric, FieldName::QualityMetric),
            (&row.improvement_metric, FieldName::ImprovementMetric),
        ]
        .map(|(raw, field)| {
            let supplied = present(raw);
            let was_supplied = supplied.is_some();
            let kept = self.screen_optional(supplied, field, &mut codes, &mut invalid_text_fields);
            let rejected = was_supplied && kept.is_none();
            (kept, rejected)
        });
        let rejected_metrics = [screened[0].1, screened[1].1, screened[2].1];
        let [(output_metric, _), (quality_metric, _), (improvement_metric, _)] = screened;

        // deadline
        let deadline = match present(&row.dead_line) {
            None => {
                codes.push(ErrorCode::MissingDeadline);
                missing_fields.push(FieldName::DeadLine);
                None
            }
            Some(text) => {
                let result = self.deadlines.parse(&text, reference_year);
                match result.failure {
                    Some(DeadlineFailure::Textual | DeadlineFailure::Ambiguous) => {
                        codes.push(ErrorCode::TextualDeadline);
                        invalid_fields.push(FieldName::DeadLine);
                    }
                    Some(DeadlineFailure::InvalidFormat) => {
                        codes.push(ErrorCode::InvalidDeadlineFormat);
                        invalid_fields.push(FieldName::DeadLine);
                    }
                    None if result.wrong_year => codes.push(ErrorCode::DeadlineWrongYear),
                    None => {}
                }
                Some(result)
            }
        };

        // mode
        let mode_hint = normalize_mode(row.mode.as_deref());
        if mode_hint.fell_back {
            codes.push(ErrorCode::ModeFallback);
        }

        invalid_text_fields.sort();
        invalid_text_fields.dedup();

        let blocking = !missing_fields.is_empty()
            || !invalid_fields.is_empty()
            || !invalid_text_fields.is_empty()
            || deadline.is_some_and(|d| !d.valid);

        ValidationOutcome {
            normalized: NormalizedRow {
                row_id: row.row_id,
                task_name,
                task_type_label,
                task_type,
                team_role_label,
                team_role,
                deadline: deadline.and_then(|d| d.calendar_date),
                strategic_benefit,
                company,
                output_metric,
                quality_metric,
                improvement_metric,
                rejected_metrics,
                mode: mode_hint.mode,
            },
            missing_fields,
            invalid_fields,
            invalid_text_fields,
            deadline,
            mode_hint,
            codes,
            blocking,
        }
    }

    /// Screen a shared-code text field. Flagged values are dropped.
    fn screen_optional(
        &self,
        value: Option<String>,
        field: FieldName,
        codes: &mut CodeSet,
        invalid_text_fields: &mut Vec<FieldName>,
    ) -> Option<String> {
        let value = value?;
        let verdict: TextVerdict = self.sanitizer.screen_into(&value, codes);
        if verdict.is_flagged() {
            codes.push(ErrorCode::UnsafeFieldText);
            invalid_text_fields.push(field);
            None
        } else {
            Some(value)
        }
    }
}

/// Trimmed, whitespace-collapsed value, or `None` when absent or blank.
pub(crate) fn present(value: &Option<String>) -> Option<String> {
    let collapsed = value
        .as_deref()?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
