//! Objective sentence generation.
//!
//! Generation is a pure function of the prepared row, its variation seed and
//! the catalog. Every choice (template, verb, deadline and metrics lead-ins,
//! baseline phrase, tail) goes through [`crate::seed::pick`] with a fixed
//! salt, so the same row always renders the same text.

pub mod cleanup;
pub mod phrasing;
pub mod template;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::{Mode, ObjectiveMode};
use crate::pipeline::PreparedRow;

use self::cleanup::finish_sentence;
use self::phrasing::{deadline_phrase, deliverable, metrics_clause, rewrite_benefit, tail_clause};
use self::template::{select_template, select_verb, Applicability};

/// Generated texts. A text is present only for the modes that were asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveResult {
    pub simple: Option<String>,
    pub complex: Option<String>,
}

impl ObjectiveResult {
    /// The single text a row carries: the only one generated, or the
    /// preferred one when both were.
    pub fn preferred(&self, preference: ObjectiveMode) -> Option<(ObjectiveMode, &str)> {
        let simple = self.simple.as_deref().map(|t| (ObjectiveMode::Simple, t));
        let complex = self.complex.as_deref().map(|t| (ObjectiveMode::Complex, t));
        match preference {
            ObjectiveMode::Simple => simple.or(complex),
            ObjectiveMode::Complex => complex.or(simple),
        }
    }
}

/// A prepared row together with its generated objectives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRow {
    pub row: PreparedRow,
    pub objectives: ObjectiveResult,
}

/// Modes rendered for a requested mode.
pub fn effective_modes(mode: Mode) -> &'static [ObjectiveMode] {
    match mode {
        Mode::Simple => &[ObjectiveMode::Simple],
        Mode::Complex => &[ObjectiveMode::Complex],
        Mode::Both => &[ObjectiveMode::Simple, ObjectiveMode::Complex],
    }
}

/// Render the objective text(s) for a prepared row, consuming it.
pub fn generate(row: PreparedRow, catalog: &Catalog) -> GeneratedRow {
    let objectives = {
        let renderer = Renderer::new(&row, catalog);
        let mut result = ObjectiveResult::default();
        for mode in effective_modes(row.validation.normalized.mode) {
            let text = renderer.render(*mode);
            match mode {
                ObjectiveMode::Simple => result.simple = Some(text),
                ObjectiveMode::Complex => result.complex = Some(text),
            }
        }
        result
    };
    GeneratedRow { row, objectives }
}

/// Slot values shared by every mode of one row.
struct Renderer<'a> {
    catalog: &'a Catalog,
    facts: Applicability,
    seed: u32,
    role_key: String,
    task_key: String,
    deliverable: String,
    deadline: String,
    metrics: String,
    tail: String,
}

impl<'a> Renderer<'a> {
    fn new(row: &PreparedRow, catalog: &'a Catalog) -> Self {
        let normalized = &row.validation.normalized;
        let seed = row.variation_seed;
        let company = normalized.company.as_deref();
        let benefit = rewrite_benefit(&normalized.strategic_benefit, catalog);
        let metrics = metrics_clause(&row.metrics.metrics, seed, catalog);

        let facts = Applicability {
            family: normalized.team_role.map(|r| r.family),
            lead: normalized.team_role.is_some_and(|r| r.lead),
            task_type: normalized.task_type,
            has_metrics: !metrics.is_empty(),
            has_specific_company: company
                .is_some_and(|c| !c.trim().is_empty() && !catalog.is_generic_company(c)),
            has_benefit: !benefit.is_empty(),
        };

        Self {
            catalog,
            facts,
            seed,
            role_key: normalized.team_role_label.to_lowercase(),
            task_key: normalized.task_type_label.to_lowercase(),
            deliverable: deliverable(&normalized.task_name, normalized.team_role, catalog),
            deadline: deadline_phrase(normalized.deadline, seed, catalog),
            tail: tail_clause(company, &benefit, seed, catalog),
            metrics,
        }
    }

    fn render(&self, mode: ObjectiveMode) -> String {
        let choice = select_template(
            self.catalog,
            mode,
            &self.facts,
            self.seed,
            &self.role_key,
            &self.task_key,
        );
        let verb = select_verb(
            self.catalog,
            choice.verb_slot,
            self.facts.family,
            self.seed,
            &self.role_key,
        );
        let filled = fill_slots(choice.text, |slot| match slot {
            "verb" => Some(verb),
            "deliverable" => Some(self.deliverable.as_str()),
            "deadline" => Some(self.deadline.as_str()),
            "metrics" => Some(self.metrics.as_str()),
            "tail" => Some(self.tail.as_str()),
            _ => None,
        });
        finish_sentence(&filled, self.catalog)
    }
}

/// Single-pass `{slot}` substitution. Inserted values are never re-scanned;
/// unknown slots are left in place for the cleanup pass.
pub fn fill_slots<'v, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
