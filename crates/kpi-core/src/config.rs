//! Pipeline configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//!
//! - `KPI_REFERENCE_YEAR`: year deadlines are expected to fall in
//! - `KPI_YEAR_POLICY`: `strict` or `lenient`
//! - `KPI_MAX_BATCH_ROWS`: bulk submission ceiling

use std::path::Path;
use std::str::FromStr;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, ObjectiveMode};

pub const ENV_REFERENCE_YEAR: &str = "KPI_REFERENCE_YEAR";
pub const ENV_YEAR_POLICY: &str = "KPI_YEAR_POLICY";
pub const ENV_MAX_BATCH_ROWS: &str = "KPI_MAX_BATCH_ROWS";

pub const DEFAULT_MAX_BATCH_ROWS: usize = 5000;
pub const DEFAULT_PARALLEL_CHUNK_SIZE: usize = 256;

/// Substrings always treated as dangerous, in addition to configured ones.
pub const BUILTIN_DENY_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "/etc/passwd",
    "<?php",
    "base64,",
    "cmd.exe",
    "powershell -",
];

/// Whole values always treated as low-signal, in addition to configured ones.
pub const BUILTIN_LOW_SIGNAL_VALUES: &[&str] = &[
    "n/a",
    "na",
    "none",
    "null",
    "nil",
    "tbd",
    "tba",
    "test",
    "asdf",
    "xxx",
    "lorem ipsum",
    "idk",
    "nothing",
];

/// What a deadline outside the reference year does to the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearPolicy {
    /// Wrong year makes the row INVALID.
    #[default]
    Strict,
    /// Wrong year makes the row NEEDS_REVIEW.
    Lenient,
}

impl YearPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl FromStr for YearPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(ConfigError::InvalidOverride {
                key: ENV_YEAR_POLICY.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Year deadlines are compared against. `None` means the current UTC year.
    pub reference_year: Option<i32>,
    pub year_policy: YearPolicy,
    /// Which text a `both`-mode row carries in its output.
    pub both_mode_preference: ObjectiveMode,
    pub deny_substrings: Vec<String>,
    pub low_signal_values: Vec<String>,
    pub max_batch_rows: usize,
    pub parallel_chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_year: None,
            year_policy: YearPolicy::Strict,
            both_mode_preference: ObjectiveMode::Complex,
            deny_substrings: Vec::new(),
            low_signal_values: Vec::new(),
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
            parallel_chunk_size: DEFAULT_PARALLEL_CHUNK_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// File (when given) then environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_REFERENCE_YEAR) {
            let year = value
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: ENV_REFERENCE_YEAR.to_string(),
                    value: value.clone(),
                })?;
            self.reference_year = Some(year);
        }
        if let Some(value) = get(ENV_YEAR_POLICY) {
            self.year_policy = value.parse()?;
        }
        if let Some(value) = get(ENV_MAX_BATCH_ROWS) {
            self.max_batch_rows =
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidOverride {
                        key: ENV_MAX_BATCH_ROWS.to_string(),
                        value: value.clone(),
                    })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn with_year_policy(mut self, policy: YearPolicy) -> Self {
        self.year_policy = policy;
        self
    }

    pub fn with_both_mode_preference(mut self, preference: ObjectiveMode) -> Self {
        self.both_mode_preference = preference;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_rows == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_rows must be positive".to_string(),
            ));
        }
        if self.parallel_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "parallel_chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured reference year, or the current UTC year.
    pub fn resolve_reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Built-in deny substrings followed by configured ones.
    pub fn effective_deny_substrings(&self) -> Vec<String> {
        merge(BUILTIN_DENY_SUBSTRINGS, &self.deny_substrings)
    }

    /// Built-in low-signal values followed by configured ones.
    pub fn effective_low_signal_values(&self) -> Vec<String> {
        merge(BUILTIN_LOW_SIGNAL_VALUES, &self.low_signal_values)
    }
}

fn merge(builtin: &[&str], configured: &[String]) -> Vec<String> {
    builtin
        .iter()
        .map(|s| s.to_string())
        .chain(configured.iter().cloned())
        .collect()
}
