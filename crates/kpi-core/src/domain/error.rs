//! Domain-level error taxonomy for the KPI pipeline.
//!
//! Row-level problems never surface here; they accumulate as [`ErrorCode`]s
//! on the row. These errors cover loading collaborator data, configuration
//! and submission documents.
//!
//! [`ErrorCode`]: super::codes::ErrorCode

/// Errors produced while loading or validating the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("template {id} references unknown slot: {slot}")]
    UnknownSlot { id: String, slot: String },

    #[error("template {id} has no {{deliverable}} slot")]
    MissingDeliverable { id: String },

    #[error("duplicate template id: {0}")]
    DuplicateTemplate(String),

    #[error("matrix bucket {bucket} has no entries")]
    EmptyBucket { bucket: String },

    #[error("matrix bucket {bucket} has an empty metric in entry {index}")]
    EmptyMetric { bucket: String, index: usize },

    #[error("{table} entry is missing placeholder {placeholder}: {entry}")]
    MissingPlaceholder {
        table: String,
        placeholder: String,
        entry: String,
    },

    #[error("tail rule {index} has no templates")]
    EmptyTailRule { index: usize },

    #[error("invalid rewrite pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while loading pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: String, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced at the submission boundary.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("batch of {rows} rows exceeds the limit of {limit} (E602)")]
    TooLarge { rows: usize, limit: usize },
}

/// KPI pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum KpiError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("internal regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("batch worker failed: {0}")]
    Worker(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for KPI pipeline operations.
pub type Result<T> = std::result::Result<T, KpiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::UnknownSlot {
            id: "simple-1".to_string(),
            slot: "owner".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("simple-1"));
        assert!(msg.contains("owner"));

        let err = CatalogError::MissingDeliverable {
            id: "complex-2".to_string(),
        };
        assert!(err.to_string().contains("{deliverable}"));
    }

    #[test]
    fn test_submission_too_large_mentions_code() {
        let err = SubmissionError::TooLarge {
            rows: 10,
            limit: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("E602"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_kpi_error_wraps_config() {
        let err: KpiError = ConfigError::Invalid("max_batch_rows must be positive".into()).into();
        assert!(err.to_string().contains("config error"));
        assert!(err.to_string().contains("max_batch_rows"));
    }
}
