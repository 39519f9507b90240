//! Template and verb selection.

use crate::catalog::{Catalog, TemplateSpec};
use crate::domain::{ObjectiveMode, RoleFamily, TaskType};
use crate::seed::{pick, salts};

pub const SIMPLE_FALLBACK_TEMPLATE: &str = "{verb} the {deliverable} {deadline}.";
pub const COMPLEX_FALLBACK_TEMPLATE: &str = "{verb} the {deliverable} {deadline}, {metrics}, {tail}.";
pub const FALLBACK_VERB_SLOT: &str = "deliver";
pub const LAST_RESORT_VERB: &str = "deliver";

/// Row facts the applicability filters look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applicability {
    pub family: Option<RoleFamily>,
    pub lead: bool,
    pub task_type: Option<TaskType>,
    pub has_metrics: bool,
    /// A non-generic company name is present.
    pub has_specific_company: bool,
    pub has_benefit: bool,
}

impl Applicability {
    pub fn admits(&self, spec: &TemplateSpec, mode: ObjectiveMode) -> bool {
        spec.mode == mode
            && (spec.role_families.is_empty()
                || self.family.is_some_and(|f| spec.role_families.contains(&f)))
            && (spec.task_types.is_empty()
                || self.task_type.is_some_and(|t| spec.task_types.contains(&t)))
            && (!spec.lead_only || self.lead)
            && (!spec.requires_metrics || self.has_metrics)
            && (!spec.requires_company || self.has_specific_company)
            && (!spec.requires_benefit || self.has_benefit)
    }
}

/// The template chosen for one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateChoice<'a> {
    /// `None` for the built-in fallback.
    pub id: Option<&'a str>,
    pub text: &'a str,
    pub verb_slot: &'a str,
}

pub fn select_template<'a>(
    catalog: &'a Catalog,
    mode: ObjectiveMode,
    facts: &Applicability,
    seed: u32,
    role_key: &str,
    task_key: &str,
) -> TemplateChoice<'a> {
    let candidates: Vec<&TemplateSpec> = catalog
        .templates()
        .iter()
        .filter(|t| facts.admits(t, mode))
        .collect();
    let salt = salts::template(mode.as_str(), role_key, task_key);

    match pick(seed, &salt, &candidates).copied() {
        Some(spec) => TemplateChoice {
            id: Some(spec.id.as_str()),
            text: spec.text.as_str(),
            verb_slot: spec.verb_slot.as_str(),
        },
        None => TemplateChoice {
            id: None,
            text: match mode {
                ObjectiveMode::Simple => SIMPLE_FALLBACK_TEMPLATE,
                ObjectiveMode::Complex => COMPLEX_FALLBACK_TEMPLATE,
            },
            verb_slot: FALLBACK_VERB_SLOT,
        },
    }
}

pub fn select_verb<'a>(
    catalog: &'a Catalog,
    slot: &str,
    family: Option<RoleFamily>,
    seed: u32,
    role_key: &str,
) -> &'a str {
    let verbs = catalog.verbs_for(slot, family);
    if let Some(verb) = pick(seed, &salts::verb(slot, role_key), &verbs).copied() {
        return verb;
    }
    let fallback = catalog.fallback_verb().trim();
    if fallback.is_empty() {
        LAST_RESORT_VERB
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> Applicability {
        Applicability {
            family: Some(RoleFamily::Design),
            lead: false,
            task_type: Some(TaskType::Project),
            has_metrics: true,
            has_specific_company: false,
            has_benefit: true,
        }
    }

    #[test]
    fn test_filters_respect_role_and_lead() {
        let catalog = Catalog::builtin().unwrap();
        let f = facts();
        for spec in catalog.templates() {
            if !f.admits(spec, ObjectiveMode::Complex) {
                continue;
            }
            assert_eq!(spec.mode, ObjectiveMode::Complex);
            assert!(!spec.lead_only, "{}", spec.id);
            assert!(!spec.requires_company, "{}", spec.id);
            assert!(
                spec.role_families.is_empty() || spec.role_families.contains(&RoleFamily::Design),
                "{}",
                spec.id
            );
        }
    }

    #[test]
    fn test_selection_is_seeded() {
        let catalog = Catalog::builtin().unwrap();
        let f = facts();
        let a = select_template(&catalog, ObjectiveMode::Simple, &f, 99, "design", "project");
        let b = select_template(&catalog, ObjectiveMode::Simple, &f, 99, "design", "project");
        assert_eq!(a, b);
        assert!(a.id.is_some());
    }

    #[test]
    fn test_no_candidates_uses_fallback() {
        let catalog = Catalog::builtin().unwrap();
        let f = Applicability {
            has_metrics: false,
            ..facts()
        };
        let choice = select_template(&catalog, ObjectiveMode::Complex, &f, 1, "design", "project");
        assert_eq!(choice.id, None);
        assert_eq!(choice.text, COMPLEX_FALLBACK_TEMPLATE);
    }

    #[test]
    fn test_unknown_verb_slot_falls_back() {
        let catalog = Catalog::builtin().unwrap();
        let verb = select_verb(&catalog, "juggle", Some(RoleFamily::Design), 3, "design");
        assert_eq!(verb, catalog.fallback_verb());
    }

    #[test]
    fn test_family_specific_verbs() {
        let catalog = Catalog::builtin().unwrap();
        let verb = select_verb(&catalog, "build", Some(RoleFamily::Development), 3, "development");
        assert!(["build", "implement", "engineer"].contains(&verb));
    }
}
