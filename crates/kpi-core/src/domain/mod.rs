//! Domain models for the KPI pipeline.
//!
//! Canonical definitions for the core entities:
//! - `RawRow` / `NormalizedRow`: input and its validated canonical form
//! - `FinalRow`: terminal per-row result
//! - `ErrorCode` / `CodeSet`: row-level code taxonomy
//! - `KpiError`: typed errors for catalog, config and submission handling

pub mod codes;
pub mod error;
pub mod row;

// Re-export main types and errors
pub use codes::{CodeSet, ErrorCode, Severity};
pub use error::{CatalogError, ConfigError, KpiError, Result, SubmissionError};
pub use row::{
    FieldName, FinalRow, Mode, NormalizedRow, ObjectiveMode, RawRow, ResolvedMetrics, RoleFamily,
    RowStatus, TaskType, TeamRole,
};
