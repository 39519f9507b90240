//! KPI Core Library
//!
//! Validation, metric completion and objective generation for KPI rows,
//! plus the batch runner and submission boundary built on top of them.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod deadline;
pub mod domain;
pub mod metrics;
pub mod normalize;
pub mod objective;
pub mod obs;
pub mod pipeline;
pub mod resolver;
pub mod sanitizer;
pub mod seed;
pub mod status;
pub mod submission;
pub mod telemetry;
pub mod validator;

pub use domain::{
    CatalogError, CodeSet, ConfigError, ErrorCode, FieldName, FinalRow, KpiError, Mode,
    NormalizedRow, ObjectiveMode, RawRow, ResolvedMetrics, Result, RoleFamily, RowStatus,
    Severity, SubmissionError, TaskType, TeamRole,
};

pub use batch::{process_batch, process_batch_parallel, BatchReport, BatchSummary};
pub use catalog::{Catalog, CatalogDocument, BUILTIN_CATALOG_JSON};
pub use config::{PipelineConfig, YearPolicy};
pub use deadline::{DeadlineFailure, DeadlineParser, DeadlineResult};
pub use normalize::{normalize_mode, normalize_task_type, normalize_team_role, ModeHint};
pub use objective::{generate, GeneratedRow, ObjectiveResult};
pub use pipeline::{PipelineContext, PreparedRow};
pub use resolver::{resolve_metrics, MetricSource, MetricsOutcome};
pub use sanitizer::{Sanitizer, TextVerdict};
pub use seed::variation_seed;
pub use status::assemble;
pub use submission::{process_submission, process_submission_parallel, Admission, Submission};
pub use validator::{DomainValidator, ValidationOutcome};

pub use metrics::METRICS;
pub use obs::{BatchSpan, RowSpan};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
