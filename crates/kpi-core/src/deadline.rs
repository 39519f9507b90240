//! Deadline normalization.
//!
//! Loosely formatted deadlines are matched against a fixed list of date
//! grammars and converted with strict calendar arithmetic: out-of-range
//! components are errors, never rolled into the next month or year.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sanitizer::{MARKUP_PATTERN, SCRIPT_PATTERN};

/// Why a deadline could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineFailure {
    /// Markup or script markers present.
    Textual,
    /// Quarter, fiscal-year or year-end idiom.
    Ambiguous,
    /// No grammar matched, or the matched date does not exist.
    InvalidFormat,
}

/// Outcome of parsing one deadline string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineResult {
    pub valid: bool,
    pub wrong_year: bool,
    pub calendar_date: Option<NaiveDate>,
    pub failure: Option<DeadlineFailure>,
}

impl DeadlineResult {
    fn failed(failure: DeadlineFailure) -> Self {
        Self {
            valid: false,
            wrong_year: false,
            calendar_date: None,
            failure: Some(failure),
        }
    }

    fn parsed(date: NaiveDate, reference_year: i32) -> Self {
        Self {
            valid: true,
            wrong_year: date.year() != reference_year,
            calendar_date: Some(date),
            failure: None,
        }
    }

    /// Whether the string was rejected as text rather than a malformed date.
    pub fn is_textual(&self) -> bool {
        matches!(
            self.failure,
            Some(DeadlineFailure::Textual | DeadlineFailure::Ambiguous)
        )
    }

    /// Canonical `YYYY-MM-DD` form of an accepted deadline.
    pub fn canonical(&self) -> Option<String> {
        self.calendar_date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Component order of a date grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    YearMonthDay,
    DayMonthYear,
    DayMonthNameYear,
    MonthNameDayYear,
}

const GRAMMARS: &[(&str, Order)] = &[
    (r"^(\d{4})-(\d{1,2})-(\d{1,2})$", Order::YearMonthDay),
    (
        r"^(\d{4})-(\d{1,2})-(\d{1,2})[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?$",
        Order::YearMonthDay,
    ),
    (r"^(\d{4})/(\d{1,2})/(\d{1,2})$", Order::YearMonthDay),
    (r"^(\d{4})\.(\d{1,2})\.(\d{1,2})$", Order::YearMonthDay),
    (r"^(\d{4}) (\d{1,2}) (\d{1,2})$", Order::YearMonthDay),
    (r"^(\d{1,2})/(\d{1,2})/(\d{4})$", Order::DayMonthYear),
    (r"^(\d{1,2})-(\d{1,2})-(\d{4})$", Order::DayMonthYear),
    (r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$", Order::DayMonthYear),
    (r"^(\d{1,2}) (\d{1,2}) (\d{4})$", Order::DayMonthYear),
    (
        r"(?i)^(\d{1,2})(?:st|nd|rd|th)? ([a-z]+)\.?,? (\d{4})$",
        Order::DayMonthNameYear,
    ),
    (r"(?i)^(\d{1,2})-([a-z]{3,9})-(\d{4})$", Order::DayMonthNameYear),
    (
        r"(?i)^([a-z]+)\.? (\d{1,2})(?:st|nd|rd|th)?,? (\d{4})$",
        Order::MonthNameDayYear,
    ),
];

const AMBIGUOUS_PATTERN: &str = r"(?i)\bq[1-4]\b|\bfy\s*'?\d{2,4}\b|\byear[\s-]*end\b|\bend\s+of\s+(?:the\s+)?year\b|\beoy\b";

/// Compiled deadline parser.
#[derive(Debug, Clone)]
pub struct DeadlineParser {
    markup: Regex,
    script: Regex,
    ambiguous: Regex,
    grammars: Vec<(Regex, Order)>,
}

impl DeadlineParser {
    pub fn new() -> Result<Self, regex::Error> {
        let grammars = GRAMMARS
            .iter()
            .map(|(pattern, order)| Ok((Regex::new(pattern)?, *order)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            markup: Regex::new(MARKUP_PATTERN)?,
            script: Regex::new(SCRIPT_PATTERN)?,
            ambiguous: Regex::new(AMBIGUOUS_PATTERN)?,
            grammars,
        })
    }

    /// Parse `text`, flagging a year other than `reference_year`.
    pub fn parse(&self, text: &str, reference_year: i32) -> DeadlineResult {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.markup.is_match(&collapsed) || self.script.is_match(&collapsed) {
            return DeadlineResult::failed(DeadlineFailure::Textual);
        }
        if self.ambiguous.is_match(&collapsed) {
            return DeadlineResult::failed(DeadlineFailure::Ambiguous);
        }

        let Some((captures, order)) = self
            .grammars
            .iter()
            .find_map(|(re, order)| re.captures(&collapsed).map(|c| (c, *order)))
        else {
            return DeadlineResult::failed(DeadlineFailure::InvalidFormat);
        };

        let group = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or_default();
        let date = match order {
            Order::YearMonthDay => numeric_date(group(1), group(2), group(3)),
            Order::DayMonthYear => numeric_date(group(3), group(2), group(1)),
            Order::DayMonthNameYear => named_date(group(3), group(2), group(1)),
            Order::MonthNameDayYear => named_date(group(3), group(1), group(2)),
        };

        match date {
            Some(date) => DeadlineResult::parsed(date, reference_year),
            None => DeadlineResult::failed(DeadlineFailure::InvalidFormat),
        }
    }
}

fn numeric_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn named_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lowered = name.to_lowercase();
    if lowered == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|full| *full == lowered || (lowered.len() == 3 && full.starts_with(&lowered)))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DeadlineResult {
        DeadlineParser::new().unwrap().parse(text, 2025)
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_all_grammars() {
        let cases = [
            ("2025-10-01", date(2025, 10, 1)),
            ("2025-10-01T09:30:00Z", date(2025, 10, 1)),
            ("2025/10/01", date(2025, 10, 1)),
            ("2025.10.01", date(2025, 10, 1)),
            ("2025 10 01", date(2025, 10, 1)),
            ("01/10/2025", date(2025, 10, 1)),
            ("01-10-2025", date(2025, 10, 1)),
            ("1.10.2025", date(2025, 10, 1)),
            ("01 10 2025", date(2025, 10, 1)),
            ("1st October, 2025", date(2025, 10, 1)),
            ("01-Oct-2025", date(2025, 10, 1)),
            ("October 1, 2025", date(2025, 10, 1)),
            ("Sept 3rd 2025", date(2025, 9, 3)),
        ];
        for (text, expected) in cases {
            let result = parse(text);
            assert!(result.valid, "{text} should parse");
            assert_eq!(result.calendar_date, expected, "{text}");
            assert!(!result.wrong_year, "{text}");
        }
    }

    #[test]
    fn test_numeric_with_trailing_year_is_day_first() {
        let result = parse("03/04/2025");
        assert_eq!(result.calendar_date, date(2025, 4, 3));
    }

    #[test]
    fn test_rollover_is_rejected() {
        for text in ["2025-13-40", "2025-02-30", "32/01/2025", "31 April 2025"] {
            let result = parse(text);
            assert!(!result.valid, "{text}");
            assert!(!result.wrong_year, "{text}");
            assert_eq!(result.failure, Some(DeadlineFailure::InvalidFormat), "{text}");
        }
    }

    #[test]
    fn test_ambiguous_idioms_are_textual() {
        for text in ["Q3", "q4 2025", "FY25", "FY 2026", "year end", "Year-End 2025", "EOY"] {
            let result = parse(text);
            assert_eq!(result.failure, Some(DeadlineFailure::Ambiguous), "{text}");
            assert!(result.is_textual());
        }
    }

    #[test]
    fn test_markup_is_textual() {
        let result = parse("<b>2025-10-01</b>");
        assert_eq!(result.failure, Some(DeadlineFailure::Textual));
    }

    #[test]
    fn test_script_markers_are_textual() {
        for text in ["javascript:alert(1)", "2025-10-01 onclick=go()", "eval(2025)"] {
            assert_eq!(
                parse(text).failure,
                Some(DeadlineFailure::Textual),
                "{text}"
            );
        }
    }

    #[test]
    fn test_unknown_shape_is_invalid_format() {
        for text in ["next month", "2025-10", "10/01/25", "Octember 1, 2025"] {
            assert_eq!(
                parse(text).failure,
                Some(DeadlineFailure::InvalidFormat),
                "{text}"
            );
        }
    }

    #[test]
    fn test_wrong_year_is_flag_not_failure() {
        let result = parse("2026-03-15");
        assert!(result.valid);
        assert!(result.wrong_year);
        assert_eq!(result.failure, None);
    }

    #[test]
    fn test_canonical_round_trip() {
        let parser = DeadlineParser::new().unwrap();
        for text in ["1 Feb 2024", "29/02/2024", "2025.12.31", "March 9, 2030"] {
            let first = parser.parse(text, 2025);
            let canonical = first.canonical().unwrap();
            let second = parser.parse(&canonical, 2025);
            assert_eq!(first.calendar_date, second.calendar_date, "{text}");
        }
    }
}
