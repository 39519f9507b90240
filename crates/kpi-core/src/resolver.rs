//! Metrics completion from the role/task matrix.

use serde::{Deserialize, Serialize};

use crate::catalog::{bucket_key, Catalog, MetricTriple};
use crate::domain::{ErrorCode, NormalizedRow, ResolvedMetrics, RoleFamily};
use crate::seed::{pick_index, salts};

/// Where auto-filled metrics came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSource {
    Matrix { bucket: String, index: usize },
    Default { family: Option<RoleFamily>, lead: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsOutcome {
    pub metrics: ResolvedMetrics,
    /// Output, quality, improvement.
    pub auto_filled: [bool; 3],
    /// Set when at least one slot was filled.
    pub source: Option<MetricSource>,
}

impl MetricsOutcome {
    pub fn auto_filled_count(&self) -> usize {
        self.auto_filled.iter().filter(|f| **f).count()
    }

    pub fn was_auto_filled(&self) -> bool {
        self.auto_filled_count() > 0
    }

    /// E501 when every slot was filled, E502 for one or two.
    pub fn code(&self) -> Option<ErrorCode> {
        match self.auto_filled_count() {
            0 => None,
            3 => Some(ErrorCode::AllMetricsSuggested),
            _ => Some(ErrorCode::PartialMetricsSuggested),
        }
    }
}

/// Fill each missing metric slot. Supplied values are kept verbatim;
/// slots rejected by screening stay empty and are not counted as filled.
pub fn resolve_metrics(row: &NormalizedRow, seed: u32, catalog: &Catalog) -> MetricsOutcome {
    let supplied = [
        row.output_metric.as_deref(),
        row.quality_metric.as_deref(),
        row.improvement_metric.as_deref(),
    ]
    .map(|m| m.map(str::trim).filter(|m| !m.is_empty()));
    let mut auto_filled = [false; 3];
    for (slot, filled) in auto_filled.iter_mut().enumerate() {
        *filled = supplied[slot].is_none() && !row.rejected_metrics[slot];
    }

    if !auto_filled.iter().any(|f| *f) {
        return MetricsOutcome {
            metrics: triple_to_metrics(supplied.map(|m| m.unwrap_or_default())),
            auto_filled,
            source: None,
        };
    }

    let (candidate, source) = candidate_triple(row, seed, catalog);
    let fallback = [
        candidate.output.as_str(),
        candidate.quality.as_str(),
        candidate.improvement.as_str(),
    ];
    let mut merged = [""; 3];
    for (slot, value) in merged.iter_mut().enumerate() {
        *value = match supplied[slot] {
            Some(kept) => kept,
            None if auto_filled[slot] => fallback[slot],
            None => "",
        };
    }

    MetricsOutcome {
        metrics: triple_to_metrics(merged),
        auto_filled,
        source: Some(source),
    }
}

fn candidate_triple<'a>(
    row: &NormalizedRow,
    seed: u32,
    catalog: &'a Catalog,
) -> (&'a MetricTriple, MetricSource) {
    let family = row.team_role.map(|r| r.family);
    let lead = row.team_role.is_some_and(|r| r.lead);

    if let (Some(family), Some(task_type)) = (family, row.task_type) {
        if let Some(bucket) = catalog.bucket(family, task_type) {
            let key = bucket_key(family, task_type);
            if let Some(index) = pick_index(seed, &salts::metrics(&key), bucket.entries.len()) {
                return (
                    &bucket.entries[index],
                    MetricSource::Matrix { bucket: key, index },
                );
            }
        }
    }

    (
        catalog.defaults().for_family(family).pick(lead),
        MetricSource::Default { family, lead },
    )
}

fn triple_to_metrics([output, quality, improvement]: [&str; 3]) -> ResolvedMetrics {
    ResolvedMetrics {
        output_metric: output.to_string(),
        quality_metric: quality.to_string(),
        improvement_metric: improvement.to_string(),
    }
}
