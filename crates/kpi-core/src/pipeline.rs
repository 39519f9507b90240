//! Single-row pipeline: validate, seed, resolve metrics, generate, assemble.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::domain::{FinalRow, RawRow, Result};
use crate::metrics::METRICS;
use crate::objective::generate;
use crate::obs;
use crate::resolver::{resolve_metrics, MetricsOutcome};
use crate::seed::variation_seed;
use crate::status::assemble;
use crate::validator::{present, DomainValidator, ValidationOutcome, ValidationSummary};

/// Canonical row with resolved metrics and its variation seed.
///
/// Built once by [`PipelineContext::prepare`] and moved into the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRow {
    pub validation: ValidationOutcome,
    pub metrics: MetricsOutcome,
    pub variation_seed: u32,
}

/// Everything a row needs besides its own contents.
///
/// The reference year is resolved once, when the context is built, so all
/// rows processed through one context agree on it.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    catalog: Arc<Catalog>,
    validator: DomainValidator,
    config: PipelineConfig,
    reference_year: i32,
}

impl PipelineContext {
    pub fn new(catalog: Arc<Catalog>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let validator = DomainValidator::new(&config)?;
        let reference_year = config.resolve_reference_year();
        Ok(Self {
            catalog,
            validator,
            config,
            reference_year,
        })
    }

    /// Context over the built-in catalog.
    pub fn with_builtin_catalog(config: PipelineConfig) -> Result<Self> {
        Self::new(Arc::new(Catalog::builtin()?), config)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn validator(&self) -> &DomainValidator {
        &self.validator
    }

    /// Validate the row, derive its seed and fill missing metrics.
    pub fn prepare(&self, row: &RawRow) -> PreparedRow {
        let validation = self.validator.validate(row, self.reference_year);
        obs::emit_row_validated(&ValidationSummary::from(&validation));

        let normalized = &validation.normalized;
        // submitted company, even when screening blanked it
        let company = present(&row.company).unwrap_or_default();
        let seed = variation_seed(
            &normalized.team_role_label,
            &normalized.task_type_label,
            &company,
            normalized.row_id,
        );
        let metrics = resolve_metrics(normalized, seed, &self.catalog);

        PreparedRow {
            validation,
            metrics,
            variation_seed: seed,
        }
    }

    /// Run one row end to end.
    pub fn process_row(&self, row: &RawRow) -> FinalRow {
        let _span = obs::RowSpan::enter(row.row_id);
        let prepared = self.prepare(row);
        let generated = generate(prepared, &self.catalog);
        let final_row = assemble(generated, &self.config);

        METRICS.record_row(final_row.status(), final_row.metrics_auto_suggested());
        obs::emit_row_finalized(
            final_row.row_id(),
            final_row.status(),
            final_row.error_codes().len(),
        );
        final_row
    }
}
