//! Post-substitution text passes.

use crate::catalog::{Catalog, CompiledRule};

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ' '];

/// Run the structural, cosmetic and humanization passes, then normalize
/// spacing, capitalization and the final period.
pub fn finish_sentence(text: &str, catalog: &Catalog) -> String {
    let mut out = text.to_string();
    for pass in [
        catalog.structural_rules(),
        catalog.cosmetic_rules(),
        catalog.humanize_rules(),
    ] {
        out = apply_rules(&out, pass);
    }
    let out = collapse_repeated_words(&collapse_whitespace(&out));
    with_single_period(&capitalize_first(&out))
}

fn apply_rules(text: &str, rules: &[CompiledRule]) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a word that repeats the previous one, ignoring case.
pub fn collapse_repeated_words(text: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in text.split(' ') {
        if words
            .last()
            .is_some_and(|prev| prev.eq_ignore_ascii_case(word) && word.chars().any(char::is_alphabetic))
        {
            continue;
        }
        words.push(word);
    }
    words.join(" ")
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip trailing punctuation and spaces.
pub fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim().trim_end_matches(TRAILING_PUNCTUATION)
}

/// Exactly one trailing period. Empty text stays empty.
pub fn with_single_period(text: &str) -> String {
    let body = trim_trailing_punctuation(text);
    if body.is_empty() {
        return String::new();
    }
    format!("{body}.")
}
