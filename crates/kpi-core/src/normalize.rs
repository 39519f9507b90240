//! Canonicalization of enumerated row fields.

use serde::{Deserialize, Serialize};

use crate::domain::{Mode, RoleFamily, TaskType, TeamRole};

/// Allowed team role labels.
pub const TEAM_ROLE_ALLOW_LIST: &[&str] = &[
    "Content",
    "Content Lead",
    "Design",
    "Design Lead",
    "Development",
    "Development Lead",
];

/// Family prefixes recognised before a dash in a free-form role.
const FAMILY_PREFIXES: [(&str, RoleFamily); 3] = [
    ("content", RoleFamily::Content),
    ("design", RoleFamily::Design),
    ("dev", RoleFamily::Development),
];

/// Result of normalizing a task type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTypeMatch {
    Allowed(TaskType),
    /// Input returned unchanged (trimmed), never coerced.
    NotAllowed(String),
}

/// Match a task type ignoring case, whitespace and separators.
pub fn normalize_task_type(input: &str) -> TaskTypeMatch {
    let key = squash(input);
    TaskType::ALL
        .into_iter()
        .find(|t| squash(t.label()) == key)
        .map(TaskTypeMatch::Allowed)
        .unwrap_or_else(|| TaskTypeMatch::NotAllowed(input.trim().to_string()))
}

/// Match a team role.
///
/// Exact case-insensitive match first; otherwise the family is taken from the
/// text before any dash, a lead qualifier from the word "lead" anywhere, and
/// the reconstructed label must itself be on the allow-list.
pub fn normalize_team_role(input: &str) -> Option<TeamRole> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if let Some(role) = lookup_role(&collapsed) {
        return Some(role);
    }

    let head = collapsed
        .split(['-', '\u{2013}', '\u{2014}'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let family = FAMILY_PREFIXES
        .iter()
        .find(|(prefix, _)| head.starts_with(prefix))
        .map(|(_, family)| *family)?;
    let lead = collapsed
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("lead"));

    let candidate = TeamRole { family, lead }.label();
    lookup_role(&candidate)
}

fn lookup_role(label: &str) -> Option<TeamRole> {
    let allowed = TEAM_ROLE_ALLOW_LIST
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(label))?;
    let lead = allowed.ends_with(" Lead");
    let family_label = allowed.trim_end_matches(" Lead");
    RoleFamily::ALL
        .into_iter()
        .find(|f| f.label() == family_label)
        .map(|family| TeamRole { family, lead })
}

/// Mode after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeHint {
    pub mode: Mode,
    /// A non-empty, unrecognised value was replaced by the default.
    pub fell_back: bool,
}

/// Normalize the requested mode; empty defaults silently to `both`.
pub fn normalize_mode(input: Option<&str>) -> ModeHint {
    let value = input.map(str::trim).unwrap_or_default().to_lowercase();
    let mode = match value.as_str() {
        "simple" => Some(Mode::Simple),
        "complex" => Some(Mode::Complex),
        "both" | "" => Some(Mode::Both),
        _ => None,
    };
    ModeHint {
        mode: mode.unwrap_or(Mode::Both),
        fell_back: mode.is_none(),
    }
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_separator_insensitive() {
        for input in ["change request", "Change_Request", " CHANGE-request ", "changerequest"] {
            assert_eq!(
                normalize_task_type(input),
                TaskTypeMatch::Allowed(TaskType::ChangeRequest),
                "{input}"
            );
        }
        assert_eq!(
            normalize_task_type("project"),
            TaskTypeMatch::Allowed(TaskType::Project)
        );
    }

    #[test]
    fn test_task_type_not_coerced() {
        assert_eq!(
            normalize_task_type("  Side Quest "),
            TaskTypeMatch::NotAllowed("Side Quest".to_string())
        );
    }

    #[test]
    fn test_team_role_exact_match() {
        assert_eq!(
            normalize_team_role("design lead"),
            Some(TeamRole {
                family: RoleFamily::Design,
                lead: true
            })
        );
        assert_eq!(
            normalize_team_role("Development"),
            Some(TeamRole {
                family: RoleFamily::Development,
                lead: false
            })
        );
    }

    #[test]
    fn test_team_role_family_from_dash_prefix() {
        assert_eq!(
            normalize_team_role("Dev - Frontend"),
            Some(TeamRole {
                family: RoleFamily::Development,
                lead: false
            })
        );
        assert_eq!(
            normalize_team_role("Content – Copy lead"),
            Some(TeamRole {
                family: RoleFamily::Content,
                lead: true
            })
        );
        assert_eq!(
            normalize_team_role("Development-Lead"),
            Some(TeamRole {
                family: RoleFamily::Development,
                lead: true
            })
        );
    }

    #[test]
    fn test_team_role_lead_must_be_a_word() {
        assert_eq!(
            normalize_team_role("Design - Leadership"),
            Some(TeamRole {
                family: RoleFamily::Design,
                lead: false
            })
        );
    }

    #[test]
    fn test_team_role_unknown_family() {
        assert_eq!(normalize_team_role("Marketing - Lead"), None);
        assert_eq!(normalize_team_role("   "), None);
    }

    #[test]
    fn test_mode_defaults() {
        assert_eq!(
            normalize_mode(None),
            ModeHint {
                mode: Mode::Both,
                fell_back: false
            }
        );
        assert_eq!(normalize_mode(Some(" Simple ")).mode, Mode::Simple);
        assert_eq!(
            normalize_mode(Some("verbose")),
            ModeHint {
                mode: Mode::Both,
                fell_back: true
            }
        );
    }
}
