//! Read-only collaborator data: the metric matrix and phrasing tables.
//!
//! The catalog is a closed set of record types deserialized from one JSON
//! document and validated once at load time. Per-row code never re-checks
//! its shape; missing candidates at runtime degrade to fixed fallbacks.

use std::collections::HashSet;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{CatalogError, ObjectiveMode, RoleFamily, TaskType};

/// Built-in catalog shipped with the crate.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../data/catalog.json");

/// Slots a sentence template may reference.
pub const TEMPLATE_SLOTS: [&str; 5] = ["verb", "deliverable", "deadline", "metrics", "tail"];

/// Slots a tail template may reference.
pub const TAIL_SLOTS: [&str; 2] = ["company", "benefit"];

const SLOT_PATTERN: &str = r"\{([^{}]*)\}";

/// One candidate metric triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricTriple {
    pub output: String,
    pub quality: String,
    pub improvement: String,
}

impl MetricTriple {
    fn fields(&self) -> [&str; 3] {
        [&self.output, &self.quality, &self.improvement]
    }
}

/// Candidate triples for one (role family, task type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixBucket {
    pub role_family: RoleFamily,
    pub task_type: TaskType,
    pub entries: Vec<MetricTriple>,
}

impl MatrixBucket {
    pub fn key(&self) -> String {
        bucket_key(self.role_family, self.task_type)
    }
}

/// Matrix bucket key, also used as the metrics salt.
pub fn bucket_key(family: RoleFamily, task_type: TaskType) -> String {
    format!("{}|{}", family.key(), task_type.key())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyDefaults {
    pub base: MetricTriple,
    pub lead: MetricTriple,
}

impl FamilyDefaults {
    pub fn pick(&self, lead: bool) -> &MetricTriple {
        if lead {
            &self.lead
        } else {
            &self.base
        }
    }
}

/// Fallback triples used when no matrix bucket matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultTriples {
    pub content: FamilyDefaults,
    pub design: FamilyDefaults,
    pub development: FamilyDefaults,
    pub generic: FamilyDefaults,
}

impl DefaultTriples {
    pub fn for_family(&self, family: Option<RoleFamily>) -> &FamilyDefaults {
        match family {
            Some(RoleFamily::Content) => &self.content,
            Some(RoleFamily::Design) => &self.design,
            Some(RoleFamily::Development) => &self.development,
            None => &self.generic,
        }
    }

    fn labelled(&self) -> [(&'static str, &FamilyDefaults); 4] {
        [
            ("content", &self.content),
            ("design", &self.design),
            ("development", &self.development),
            ("generic", &self.generic),
        ]
    }
}

/// A sentence template and its applicability filters.
///
/// Empty filter lists match everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    pub id: String,
    pub mode: ObjectiveMode,
    pub text: String,
    pub verb_slot: String,
    #[serde(default)]
    pub role_families: Vec<RoleFamily>,
    #[serde(default)]
    pub task_types: Vec<TaskType>,
    #[serde(default)]
    pub lead_only: bool,
    #[serde(default)]
    pub requires_metrics: bool,
    #[serde(default)]
    pub requires_company: bool,
    #[serde(default)]
    pub requires_benefit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerbSpec {
    pub slot: String,
    pub verb: String,
    #[serde(default)]
    pub role_families: Vec<RoleFamily>,
}

/// Tail bucket. `None` match keys accept any value; rules are tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TailRule {
    pub name: String,
    #[serde(default)]
    pub has_company: Option<bool>,
    #[serde(default)]
    pub company_is_generic: Option<bool>,
    #[serde(default)]
    pub has_benefit: Option<bool>,
    pub templates: Vec<String>,
}

impl TailRule {
    pub fn matches(&self, has_company: bool, company_is_generic: bool, has_benefit: bool) -> bool {
        let accepts = |key: Option<bool>, value: bool| key.map_or(true, |k| k == value);
        accepts(self.has_company, has_company)
            && accepts(self.company_is_generic, company_is_generic)
            && accepts(self.has_benefit, has_benefit)
    }
}

/// Regex substitution rule as written in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynonymSpec {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineTable {
    pub quality_keywords: Vec<String>,
    pub output_keywords: Vec<String>,
    pub quality: Vec<String>,
    pub output: Vec<String>,
    pub generic: Vec<String>,
}

/// Slot-level phrase variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicroTable {
    pub deadline: Vec<String>,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupTable {
    pub structural: Vec<RuleSpec>,
    pub cosmetic: Vec<RuleSpec>,
    pub humanize: Vec<RuleSpec>,
}

/// The catalog document exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    pub version: u32,
    pub date_format: String,
    pub matrix: Vec<MatrixBucket>,
    pub defaults: DefaultTriples,
    pub templates: Vec<TemplateSpec>,
    pub verbs: Vec<VerbSpec>,
    pub fallback_verb: String,
    pub tails: Vec<TailRule>,
    pub generic_companies: Vec<String>,
    pub benefit_rewrites: Vec<RuleSpec>,
    pub benefit_verbs: Vec<String>,
    pub benefit_noun_prefix: String,
    pub synonyms: Vec<SynonymSpec>,
    pub change_verbs: Vec<String>,
    pub baselines: BaselineTable,
    pub micro: MicroTable,
    pub cleanup: CleanupTable,
}

/// A compiled substitution rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    replacement: String,
}

impl CompiledRule {
    fn compile(pattern: &str, replacement: &str) -> Result<Self, CatalogError> {
        let regex = Regex::new(pattern).map_err(|e| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            regex,
            replacement: replacement.to_string(),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Loaded, validated catalog. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    doc: CatalogDocument,
    benefit_rewrites: Vec<CompiledRule>,
    synonyms: Vec<CompiledRule>,
    structural: Vec<CompiledRule>,
    cosmetic: Vec<CompiledRule>,
    humanize: Vec<CompiledRule>,
    generic_companies: HashSet<String>,
    digest: String,
}

impl Catalog {
    /// Load the catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(text)?;
        Self::from_document(doc)
    }

    /// Validate and compile a catalog document.
    pub fn from_document(doc: CatalogDocument) -> Result<Self, CatalogError> {
        validate_document(&doc)?;

        let compile_all = |rules: &[RuleSpec]| {
            rules
                .iter()
                .map(|r| CompiledRule::compile(&r.pattern, &r.replacement))
                .collect::<Result<Vec<_>, _>>()
        };
        let synonyms = doc
            .synonyms
            .iter()
            .map(|s| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&s.from));
                CompiledRule::compile(&pattern, &s.to.replace('$', "$$"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let digest = hex::encode(Sha256::digest(serde_json::to_vec(&doc)?));

        Ok(Self {
            benefit_rewrites: compile_all(&doc.benefit_rewrites)?,
            synonyms,
            structural: compile_all(&doc.cleanup.structural)?,
            cosmetic: compile_all(&doc.cleanup.cosmetic)?,
            humanize: compile_all(&doc.cleanup.humanize)?,
            generic_companies: doc
                .generic_companies
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
            digest,
            doc,
        })
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.doc
    }

    /// SHA-256 hex digest of the canonical catalog JSON.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// First matrix bucket for the pair, if any.
    pub fn bucket(&self, family: RoleFamily, task_type: TaskType) -> Option<&MatrixBucket> {
        self.doc
            .matrix
            .iter()
            .find(|b| b.role_family == family && b.task_type == task_type)
    }

    pub fn defaults(&self) -> &DefaultTriples {
        &self.doc.defaults
    }

    pub fn templates(&self) -> &[TemplateSpec] {
        &self.doc.templates
    }

    /// Verbs for `slot` applicable to `family`, in catalog order.
    pub fn verbs_for(&self, slot: &str, family: Option<RoleFamily>) -> Vec<&str> {
        self.doc
            .verbs
            .iter()
            .filter(|v| v.slot == slot)
            .filter(|v| {
                v.role_families.is_empty()
                    || family.is_some_and(|f| v.role_families.contains(&f))
            })
            .map(|v| v.verb.as_str())
            .collect()
    }

    pub fn fallback_verb(&self) -> &str {
        &self.doc.fallback_verb
    }

    pub fn tails(&self) -> &[TailRule] {
        &self.doc.tails
    }

    pub fn is_generic_company(&self, company: &str) -> bool {
        self.generic_companies
            .contains(&company.trim().to_lowercase())
    }

    pub fn benefit_rewrites(&self) -> &[CompiledRule] {
        &self.benefit_rewrites
    }

    pub fn benefit_verbs(&self) -> &[String] {
        &self.doc.benefit_verbs
    }

    pub fn benefit_noun_prefix(&self) -> &str {
        &self.doc.benefit_noun_prefix
    }

    pub fn synonyms(&self) -> &[CompiledRule] {
        &self.synonyms
    }

    pub fn change_verbs(&self) -> &[String] {
        &self.doc.change_verbs
    }

    pub fn baselines(&self) -> &BaselineTable {
        &self.doc.baselines
    }

    pub fn micro(&self) -> &MicroTable {
        &self.doc.micro
    }

    pub fn date_format(&self) -> &str {
        &self.doc.date_format
    }

    pub fn structural_rules(&self) -> &[CompiledRule] {
        &self.structural
    }

    pub fn cosmetic_rules(&self) -> &[CompiledRule] {
        &self.cosmetic
    }

    pub fn humanize_rules(&self) -> &[CompiledRule] {
        &self.humanize
    }
}

fn validate_document(doc: &CatalogDocument) -> Result<(), CatalogError> {
    let slot_re = Regex::new(SLOT_PATTERN).map_err(|e| CatalogError::InvalidPattern {
        pattern: SLOT_PATTERN.to_string(),
        reason: e.to_string(),
    })?;
    let slots_of = |text: &str| -> Vec<String> {
        slot_re
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    };

    let mut seen = HashSet::new();
    for template in &doc.templates {
        if !seen.insert(template.id.as_str()) {
            return Err(CatalogError::DuplicateTemplate(template.id.clone()));
        }
        let slots = slots_of(&template.text);
        if let Some(unknown) = slots.iter().find(|s| !TEMPLATE_SLOTS.contains(&s.as_str())) {
            return Err(CatalogError::UnknownSlot {
                id: template.id.clone(),
                slot: unknown.clone(),
            });
        }
        if !slots.iter().any(|s| s == "deliverable") {
            return Err(CatalogError::MissingDeliverable {
                id: template.id.clone(),
            });
        }
        if !doc.verbs.iter().any(|v| v.slot == template.verb_slot) {
            warn!(
                event = "catalog.verb_slot_empty",
                template = %template.id,
                slot = %template.verb_slot,
            );
        }
    }

    for bucket in &doc.matrix {
        if bucket.entries.is_empty() {
            return Err(CatalogError::EmptyBucket {
                bucket: bucket.key(),
            });
        }
        for (index, entry) in bucket.entries.iter().enumerate() {
            if entry.fields().iter().any(|f| f.trim().is_empty()) {
                return Err(CatalogError::EmptyMetric {
                    bucket: bucket.key(),
                    index,
                });
            }
        }
    }

    for (family, defaults) in doc.defaults.labelled() {
        for (variant, triple) in [("base", &defaults.base), ("lead", &defaults.lead)] {
            if triple.fields().iter().any(|f| f.trim().is_empty()) {
                return Err(CatalogError::EmptyMetric {
                    bucket: format!("defaults.{family}.{variant}"),
                    index: 0,
                });
            }
        }
    }

    for (index, rule) in doc.tails.iter().enumerate() {
        if rule.templates.is_empty() {
            return Err(CatalogError::EmptyTailRule { index });
        }
        for template in &rule.templates {
            if let Some(unknown) = slots_of(template)
                .into_iter()
                .find(|s| !TAIL_SLOTS.contains(&s.as_str()))
            {
                return Err(CatalogError::UnknownSlot {
                    id: format!("tail:{}", rule.name),
                    slot: unknown,
                });
            }
        }
    }

    for (table, placeholder, entries) in [
        ("micro.deadline", "{date}", &doc.micro.deadline),
        ("micro.metrics", "{metrics}", &doc.micro.metrics),
    ] {
        if let Some(entry) = entries.iter().find(|e| !e.contains(placeholder)) {
            return Err(CatalogError::MissingPlaceholder {
                table: table.to_string(),
                placeholder: placeholder.to_string(),
                entry: entry.clone(),
            });
        }
    }

    if StrftimeItems::new(&doc.date_format).any(|item| matches!(item, Item::Error)) {
        return Err(CatalogError::InvalidPattern {
            pattern: doc.date_format.clone(),
            reason: "invalid strftime format".to_string(),
        });
    }

    Ok(())
}
