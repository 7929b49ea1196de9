/*!
 * Text predicates shared by the normalizers.
 *
 * Only shape tests live here. Deciding what a paragraph *is* stays in the
 * normalizer of each format.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Scene heading prefixes (English and Russian screenplay conventions)
static SCENE_HEADING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:int\.?/ext|int/ext|i/e|int|ext|est|инт\.?/нат|инт|нат)[\. ]")
        .expect("Invalid scene heading regex")
});

/// Contains a letter and no lower-case letters
pub(crate) fn is_upper_case(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

/// Starts with a standard scene heading prefix such as `INT.` or `EXT `
pub(crate) fn looks_like_scene_heading(text: &str) -> bool {
    SCENE_HEADING_PREFIX.is_match(text.trim_start())
}

/// Wrapped in parentheses
pub(crate) fn is_parenthetical_shape(text: &str) -> bool {
    let text = text.trim();
    text.len() >= 2 && text.starts_with('(') && text.ends_with(')')
}

/// Upper-case line ending in `TO:` or opening with `FADE`
pub(crate) fn is_transition_shape(text: &str) -> bool {
    let text = text.trim();
    is_upper_case(text) && (text.ends_with("TO:") || text.starts_with("FADE"))
}

/// Lowercase with single spaces, e.g. `Scene  Heading` -> `scene heading`
pub(crate) fn single_spaced_lower(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup key for style or class names: lowercase, separators removed
pub(crate) fn style_key(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}
