//! Row records as they move through the pipeline.
//!
//! `RawRow` is untrusted caller input, `NormalizedRow` is the validator's
//! canonical view, `PreparedRow` adds resolved metrics and the variation
//! seed, and `FinalRow` is the terminal, immutable result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::codes::ErrorCode;

/// Untrusted input row as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRow {
    pub row_id: i64,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub team_role: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub dead_line: Option<String>,
    #[serde(default)]
    pub strategic_benefit: Option<String>,
    #[serde(default)]
    pub output_metric: Option<String>,
    #[serde(default)]
    pub quality_metric: Option<String>,
    #[serde(default)]
    pub improvement_metric: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Row fields, in the order the validator visits them.
///
/// The derived ordering doubles as the canonical listing order for
/// implicated text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    TaskName,
    TaskType,
    TeamRole,
    StrategicBenefit,
    Company,
    OutputMetric,
    QualityMetric,
    ImprovementMetric,
    DeadLine,
    Mode,
}

impl FieldName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskName => "task_name",
            Self::TaskType => "task_type",
            Self::TeamRole => "team_role",
            Self::StrategicBenefit => "strategic_benefit",
            Self::Company => "company",
            Self::OutputMetric => "output_metric",
            Self::QualityMetric => "quality_metric",
            Self::ImprovementMetric => "improvement_metric",
            Self::DeadLine => "dead_line",
            Self::Mode => "mode",
        }
    }
}

/// Allowed task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Project,
    #[serde(rename = "Change Request")]
    ChangeRequest,
    Consultation,
    Maintenance,
    Support,
    Research,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Project,
        TaskType::ChangeRequest,
        TaskType::Consultation,
        TaskType::Maintenance,
        TaskType::Support,
        TaskType::Research,
    ];

    /// Canonical display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::ChangeRequest => "Change Request",
            Self::Consultation => "Consultation",
            Self::Maintenance => "Maintenance",
            Self::Support => "Support",
            Self::Research => "Research",
        }
    }

    /// Lower-case key used in matrix bucket keys and salts.
    pub fn key(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::ChangeRequest => "change_request",
            Self::Consultation => "consultation",
            Self::Maintenance => "maintenance",
            Self::Support => "support",
            Self::Research => "research",
        }
    }
}

/// Team role family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFamily {
    Content,
    Design,
    Development,
}

impl RoleFamily {
    pub const ALL: [RoleFamily; 3] = [
        RoleFamily::Content,
        RoleFamily::Design,
        RoleFamily::Development,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "Content",
            Self::Design => "Design",
            Self::Development => "Development",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Design => "design",
            Self::Development => "development",
        }
    }
}

/// A canonical team role: a family with an optional lead qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamRole {
    pub family: RoleFamily,
    pub lead: bool,
}

impl TeamRole {
    pub fn label(self) -> String {
        if self.lead {
            format!("{} Lead", self.family.label())
        } else {
            self.family.label().to_string()
        }
    }
}

/// Requested objective mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Simple,
    Complex,
    Both,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
            Self::Both => "both",
        }
    }
}

/// The flavour of a single generated objective text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    Simple,
    Complex,
}

impl ObjectiveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
        }
    }
}

/// Terminal row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Valid,
    NeedsReview,
    Invalid,
}

/// Canonical view of a row after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub row_id: i64,
    pub task_name: String,
    /// Canonical label when the task type is allowed, trimmed input otherwise.
    pub task_type_label: String,
    pub task_type: Option<TaskType>,
    /// Canonical label when the role is allowed, trimmed input otherwise.
    pub team_role_label: String,
    pub team_role: Option<TeamRole>,
    pub deadline: Option<NaiveDate>,
    pub strategic_benefit: String,
    pub company: Option<String>,
    pub output_metric: Option<String>,
    pub quality_metric: Option<String>,
    pub improvement_metric: Option<String>,
    /// Output, quality, improvement slots whose supplied text failed
    /// screening. Rejected slots are neither kept nor auto-filled.
    pub rejected_metrics: [bool; 3],
    pub mode: Mode,
}

/// The three metric slots after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetrics {
    pub output_metric: String,
    pub quality_metric: String,
    pub improvement_metric: String,
}

impl ResolvedMetrics {
    /// Non-empty metric strings in slot order.
    pub fn non_empty(&self) -> Vec<&str> {
        [
            self.output_metric.as_str(),
            self.quality_metric.as_str(),
            self.improvement_metric.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect()
    }
}

/// Output row: terminal result for one input row.
///
/// Constructed only by the status assembler or the submission boundary and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalRow {
    row_id: i64,
    objective: String,
    objective_mode: String,
    status: RowStatus,
    comments: String,
    error_codes: Vec<ErrorCode>,
    resolved_metrics: ResolvedMetrics,
    metrics_auto_suggested: bool,
    variation_seed: u32,
}

impl FinalRow {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        row_id: i64,
        objective: String,
        objective_mode: Option<ObjectiveMode>,
        status: RowStatus,
        comments: String,
        error_codes: Vec<ErrorCode>,
        resolved_metrics: ResolvedMetrics,
        metrics_auto_suggested: bool,
        variation_seed: u32,
    ) -> Self {
        Self {
            row_id,
            objective,
            objective_mode: objective_mode
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            status,
            comments,
            error_codes,
            resolved_metrics,
            metrics_auto_suggested,
            variation_seed,
        }
    }

    pub fn row_id(&self) -> i64 {
        self.row_id
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    /// `"simple"`, `"complex"`, or `""` for INVALID rows.
    pub fn objective_mode(&self) -> &str {
        &self.objective_mode
    }

    pub fn status(&self) -> RowStatus {
        self.status
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn error_codes(&self) -> &[ErrorCode] {
        &self.error_codes
    }

    pub fn resolved_metrics(&self) -> &ResolvedMetrics {
        &self.resolved_metrics
    }

    pub fn metrics_auto_suggested(&self) -> bool {
        self.metrics_auto_suggested
    }

    pub fn variation_seed(&self) -> u32 {
        self.variation_seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_rejects_unknown_fields() {
        let json = serde_json::json!({ "row_id": 1, "priority": "high" });
        assert!(serde_json::from_value::<RawRow>(json).is_err());
    }

    #[test]
    fn test_raw_row_optional_fields_default() {
        let json = serde_json::json!({ "row_id": 7, "task_name": "Audit" });
        let row: RawRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.row_id, 7);
        assert_eq!(row.task_name.as_deref(), Some("Audit"));
        assert!(row.company.is_none());
        assert!(row.mode.is_none());
    }

    #[test]
    fn test_status_serializes_screaming() {
        let json = serde_json::to_string(&RowStatus::NeedsReview).unwrap();
        assert_eq!(json, "\"NEEDS_REVIEW\"");
    }

    #[test]
    fn test_team_role_label() {
        let role = TeamRole {
            family: RoleFamily::Design,
            lead: true,
        };
        assert_eq!(role.label(), "Design Lead");
    }

    #[test]
    fn test_field_order_is_canonical() {
        let mut fields = vec![
            FieldName::ImprovementMetric,
            FieldName::Company,
            FieldName::TaskName,
            FieldName::StrategicBenefit,
        ];
        fields.sort();
        assert_eq!(
            fields,
            vec![
                FieldName::TaskName,
                FieldName::StrategicBenefit,
                FieldName::Company,
                FieldName::ImprovementMetric,
            ]
        );
    }

    #[test]
    fn test_non_empty_metrics_skips_blank() {
        let metrics = ResolvedMetrics {
            output_metric: "3 pages shipped".into(),
            quality_metric: "  ".into(),
            improvement_metric: "10% faster load".into(),
        };
        assert_eq!(metrics.non_empty(), vec!["3 pages shipped", "10% faster load"]);
    }
}
