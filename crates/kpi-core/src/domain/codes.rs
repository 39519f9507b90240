//! Row-level error codes.
//!
//! Codes are grouped by range: 2xx missing field, 3xx invalid enum /
//! deadline / mode, 4xx unsafe or low-signal text, 5xx auto-suggested
//! metrics, 6xx transport-level rejections raised at the submission boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A short row-level error code, serialized as e.g. `"E201"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E201")]
    MissingTaskName,
    #[serde(rename = "E202")]
    MissingTaskType,
    #[serde(rename = "E203")]
    MissingTeamRole,
    #[serde(rename = "E204")]
    MissingDeadline,
    #[serde(rename = "E205")]
    MissingStrategicBenefit,

    #[serde(rename = "E301")]
    InvalidTaskType,
    #[serde(rename = "E302")]
    InvalidTeamRole,
    #[serde(rename = "E303")]
    InvalidDeadlineFormat,
    #[serde(rename = "E304")]
    DeadlineWrongYear,
    #[serde(rename = "E305")]
    ModeFallback,
    #[serde(rename = "E306")]
    TextualDeadline,

    #[serde(rename = "E401")]
    UnsafeFieldText,
    #[serde(rename = "E402")]
    DangerousContent,
    #[serde(rename = "E403")]
    LowSignalContent,
    #[serde(rename = "E404")]
    UnsafeTaskName,

    #[serde(rename = "E501")]
    AllMetricsSuggested,
    #[serde(rename = "E502")]
    PartialMetricsSuggested,

    #[serde(rename = "E601")]
    MalformedRow,
    #[serde(rename = "E602")]
    BatchTooLarge,
}

/// How a code influences the final row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Forces INVALID and suppresses objective text.
    Blocking,
    /// Forces NEEDS_REVIEW, objective text kept.
    Advisory,
    /// Downgrades at most to NEEDS_REVIEW.
    Informational,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn number(self) -> u16 {
        match self {
            Self::MissingTaskName => 201,
            Self::MissingTaskType => 202,
            Self::MissingTeamRole => 203,
            Self::MissingDeadline => 204,
            Self::MissingStrategicBenefit => 205,
            Self::InvalidTaskType => 301,
            Self::InvalidTeamRole => 302,
            Self::InvalidDeadlineFormat => 303,
            Self::DeadlineWrongYear => 304,
            Self::ModeFallback => 305,
            Self::TextualDeadline => 306,
            Self::UnsafeFieldText => 401,
            Self::DangerousContent => 402,
            Self::LowSignalContent => 403,
            Self::UnsafeTaskName => 404,
            Self::AllMetricsSuggested => 501,
            Self::PartialMetricsSuggested => 502,
            Self::MalformedRow => 601,
            Self::BatchTooLarge => 602,
        }
    }

    /// Nominal severity of the code on its own.
    ///
    /// `DeadlineWrongYear` is listed as advisory; whether it ends up blocking
    /// depends on the configured year policy.
    pub fn severity(self) -> Severity {
        match self.number() {
            201..=205 | 301..=303 | 306 | 401..=404 | 601..=602 => Severity::Blocking,
            305 => Severity::Informational,
            _ => Severity::Advisory,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.number())
    }
}

/// Accumulates codes in emission order, ignoring repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet {
    codes: Vec<ErrorCode>,
}

impl CodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a code unless it is already present.
    pub fn push(&mut self, code: ErrorCode) {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }

    pub fn extend(&mut self, other: &CodeSet) {
        for code in &other.codes {
            self.push(*code);
        }
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.codes.contains(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in the order they were first raised.
    pub fn in_emission_order(&self) -> &[ErrorCode] {
        &self.codes
    }

    /// Codes sorted by numeric value.
    pub fn sorted(&self) -> Vec<ErrorCode> {
        let mut codes = self.codes.clone();
        codes.sort();
        codes
    }
}
