//! Slot fillers: deliverable, deadline, metrics and tail clauses.

use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::domain::{ResolvedMetrics, TeamRole};
use crate::seed::{pick, salts};

use super::cleanup::{collapse_whitespace, trim_trailing_punctuation};

const ROLE_PREFIX_SEPARATORS: [char; 5] = [':', '-', '\u{2013}', '\u{2014}', '|'];

/// Words kept lower-case inside a title unless they start it.
const MINOR_WORDS: [&str; 10] = ["a", "an", "and", "as", "for", "in", "of", "on", "the", "to"];

/// Quantifiable-change class of an improvement metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineClass {
    Quality,
    Output,
    Generic,
}

impl BaselineClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Output => "output",
            Self::Generic => "generic",
        }
    }
}

/// Clean a task name into the deliverable noun phrase.
pub fn deliverable(task_name: &str, role: Option<TeamRole>, catalog: &Catalog) -> String {
    let stripped = strip_role_prefix(task_name.trim(), role);
    let substituted = catalog
        .synonyms()
        .iter()
        .fold(stripped.to_string(), |acc, rule| rule.apply(&acc));
    title_case(trim_trailing_punctuation(&collapse_whitespace(&substituted)))
}

/// Remove `Design:` / `Design - ` style prefixes naming the row's own role.
pub fn strip_role_prefix(name: &str, role: Option<TeamRole>) -> &str {
    let Some(role) = role else {
        return name;
    };
    let mut prefixes = vec![role.label(), role.family.label().to_string()];
    if role.family == crate::domain::RoleFamily::Development {
        prefixes.push("Dev".to_string());
    }
    // longest first so "Design Lead" wins over "Design"
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));

    for prefix in &prefixes {
        let Some(head) = name.get(..prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            continue;
        }
        let rest = name[prefix.len()..].trim_start();
        let Some(rest) = rest.strip_prefix(ROLE_PREFIX_SEPARATORS) else {
            continue;
        };
        let rest = rest.trim_start();
        if !rest.is_empty() {
            return rest;
        }
    }
    name
}

/// Capitalize each word; words with inner capitals (acronyms, brand casing)
/// are kept as written.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && MINOR_WORDS.contains(&lower.as_str()) {
                return lower;
            }
            if word.chars().skip(1).any(char::is_uppercase) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-case the first letter unless the first word looks like an acronym.
pub fn decapitalize(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or_default();
    if first_word.chars().skip(1).any(char::is_uppercase) {
        return text.to_string();
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deadline phrase such as "by October 1, 2025". Empty without a date.
pub fn deadline_phrase(date: Option<NaiveDate>, seed: u32, catalog: &Catalog) -> String {
    let Some(date) = date else {
        return String::new();
    };
    let formatted = date.format(catalog.date_format()).to_string();
    let variants = &catalog.micro().deadline;
    match pick(seed, &salts::micro("deadline"), variants) {
        Some(variant) => variant.replace("{date}", &formatted),
        None => format!("by {formatted}"),
    }
}

/// "a", "a and b", "a, b, and c".
pub fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Whether the improvement text describes a measurable change.
pub fn is_quantifiable(improvement: &str, catalog: &Catalog) -> bool {
    if !improvement.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if improvement.contains('%') {
        return true;
    }
    let lowered = improvement.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| catalog.change_verbs().iter().any(|v| v == word))
}

pub fn classify_baseline(improvement: &str, catalog: &Catalog) -> BaselineClass {
    let lowered = improvement.to_lowercase();
    let baselines = catalog.baselines();
    if baselines
        .quality_keywords
        .iter()
        .any(|k| lowered.contains(k.as_str()))
    {
        BaselineClass::Quality
    } else if baselines
        .output_keywords
        .iter()
        .any(|k| lowered.contains(k.as_str()))
    {
        BaselineClass::Output
    } else {
        BaselineClass::Generic
    }
}

/// Metrics clause with lead-in, e.g. "measured by a, b, and c". Empty when
/// there are no metrics.
pub fn metrics_clause(metrics: &ResolvedMetrics, seed: u32, catalog: &Catalog) -> String {
    let items: Vec<String> = metrics
        .non_empty()
        .into_iter()
        .map(|m| decapitalize(trim_trailing_punctuation(&collapse_whitespace(m))))
        .filter(|m| !m.is_empty())
        .collect();
    if items.is_empty() {
        return String::new();
    }
    let mut joined = join_list(&items);

    let improvement = metrics.improvement_metric.trim();
    if !improvement.is_empty() && is_quantifiable(improvement, catalog) {
        let class = classify_baseline(improvement, catalog);
        let baselines = catalog.baselines();
        let phrases = match class {
            BaselineClass::Quality => &baselines.quality,
            BaselineClass::Output => &baselines.output,
            BaselineClass::Generic => &baselines.generic,
        };
        if let Some(phrase) = pick(seed, &salts::baseline(class.as_str()), phrases) {
            joined = format!("{joined} {phrase}");
        }
    }

    match pick(seed, &salts::micro("metrics"), &catalog.micro().metrics) {
        Some(lead_in) => lead_in.replace("{metrics}", &joined),
        None => format!("measured by {joined}"),
    }
}

/// Benefit rewritten into a verb phrase that can follow "to".
pub fn rewrite_benefit(benefit: &str, catalog: &Catalog) -> String {
    let mut text = trim_trailing_punctuation(&collapse_whitespace(benefit)).to_string();
    if let Some(rule) = catalog
        .benefit_rewrites()
        .iter()
        .find(|rule| rule.is_match(&text))
    {
        text = rule.apply(&text);
    }
    let text = decapitalize(trim_trailing_punctuation(&collapse_whitespace(&text)));
    if text.is_empty() {
        return text;
    }

    let first = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if catalog.benefit_verbs().iter().any(|v| *v == first) {
        text
    } else {
        format!("{} {text}", catalog.benefit_noun_prefix())
    }
}

/// Tail clause chosen by the first matching rule.
pub fn tail_clause(
    company: Option<&str>,
    benefit: &str,
    seed: u32,
    catalog: &Catalog,
) -> String {
    let company = company.map(str::trim).filter(|c| !c.is_empty());
    let has_company = company.is_some();
    let generic = company.is_some_and(|c| catalog.is_generic_company(c));
    let has_benefit = !benefit.is_empty();

    let Some(rule) = catalog
        .tails()
        .iter()
        .find(|rule| rule.matches(has_company, generic, has_benefit))
    else {
        return String::new();
    };
    match pick(seed, &salts::tail(&rule.name), &rule.templates) {
        Some(template) => template
            .replace("{company}", company.unwrap_or_default())
            .replace("{benefit}", benefit),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoleFamily;

    fn design() -> Option<TeamRole> {
        Some(TeamRole {
            family: RoleFamily::Design,
            lead: false,
        })
    }

    #[test]
    fn test_strip_own_role_prefix_only() {
        assert_eq!(strip_role_prefix("Design: Homepage", design()), "Homepage");
        assert_eq!(strip_role_prefix("design - Homepage", design()), "Homepage");
        assert_eq!(
            strip_role_prefix("Content: Homepage", design()),
            "Content: Homepage"
        );
        assert_eq!(strip_role_prefix("Designer kit", design()), "Designer kit");
        assert_eq!(strip_role_prefix("Design:", design()), "Design:");
        let dev = Some(TeamRole {
            family: RoleFamily::Development,
            lead: true,
        });
        assert_eq!(strip_role_prefix("Dev | API layer", dev), "API layer");
        assert_eq!(
            strip_role_prefix("Development Lead - API layer", dev),
            "API layer"
        );
    }

    #[test]
    fn test_title_case_keeps_acronyms() {
        assert_eq!(title_case("homepage redesign"), "Homepage Redesign");
        assert_eq!(title_case("the CMS migration for iOS"), "The CMS Migration for iOS");
    }

    #[test]
    fn test_deliverable_applies_synonyms() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            deliverable("Design: homepage revamp.", design(), &catalog),
            "Homepage Redesign"
        );
        assert_eq!(
            deliverable("ui docs", None, &catalog),
            "UI Documentation"
        );
    }

    #[test]
    fn test_join_list() {
        let items = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_list(&items(&["a"])), "a");
        assert_eq!(join_list(&items(&["a", "b"])), "a and b");
        assert_eq!(join_list(&items(&["a", "b", "c"])), "a, b, and c");
        assert_eq!(join_list(&[]), "");
    }

    #[test]
    fn test_quantifiable_improvement() {
        let catalog = Catalog::builtin().unwrap();
        assert!(is_quantifiable("20% higher conversion", &catalog));
        assert!(is_quantifiable("reduce tickets by 30", &catalog));
        assert!(!is_quantifiable("better onboarding", &catalog));
        assert!(!is_quantifiable("3 new pages", &catalog));
    }

    #[test]
    fn test_baseline_classification() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            classify_baseline("10% fewer defects", &catalog),
            BaselineClass::Quality
        );
        assert_eq!(
            classify_baseline("15% more traffic", &catalog),
            BaselineClass::Output
        );
        assert_eq!(
            classify_baseline("12% uplift in renewals", &catalog),
            BaselineClass::Generic
        );
    }

    #[test]
    fn test_metrics_clause_lists_and_leads_in() {
        let catalog = Catalog::builtin().unwrap();
        let metrics = ResolvedMetrics {
            output_metric: "3 page templates.".into(),
            quality_metric: "WCAG AA compliance".into(),
            improvement_metric: "20% higher conversion".into(),
        };
        let clause = metrics_clause(&metrics, 42, &catalog);
        assert!(clause.contains("3 page templates, WCAG AA compliance, and 20% higher conversion"));
        assert!(!clause.contains('{'));
    }

    #[test]
    fn test_benefit_rewrites() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            rewrite_benefit("To improve retention.", &catalog),
            "improve retention"
        );
        assert_eq!(
            rewrite_benefit("Enhancing the brand", &catalog),
            "enhance the brand"
        );
        assert_eq!(
            rewrite_benefit("Customer loyalty", &catalog),
            "advance customer loyalty"
        );
    }

    #[test]
    fn test_tail_rules() {
        let catalog = Catalog::builtin().unwrap();
        let tail = tail_clause(Some("Acme"), "grow sales", 7, &catalog);
        assert!(tail.contains("Acme") && tail.contains("grow sales"), "{tail}");

        let tail = tail_clause(Some("the company"), "grow sales", 7, &catalog);
        assert!(!tail.contains("the company"), "{tail}");
        assert!(tail.contains("grow sales"));

        let tail = tail_clause(None, "", 7, &catalog);
        assert!(!tail.is_empty());
        assert!(!tail.contains('{'));
    }

    #[test]
    fn test_deadline_phrase_formats_date() {
        let catalog = Catalog::builtin().unwrap();
        let phrase = deadline_phrase(NaiveDate::from_ymd_opt(2025, 10, 1), 3, &catalog);
        assert!(phrase.ends_with("October 1, 2025"), "{phrase}");
        assert_eq!(deadline_phrase(None, 3, &catalog), "");
    }
}
