//! Parses a single extracted `{{...}}` template string into its normalised
//! name and an ordered parameter map.

use super::grammar::{self, TIERS};
use crate::strutil;
use indexmap::IndexMap;

/// A single template invocation: its normalised name and ordered params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub params: IndexMap<String, String>,
}

/// Parses one template string (as produced by the extractor) against the
/// `markers` dictionary it was extracted with.
///
/// Returns `None` only if `template_text` does not itself match the
/// `template` grammar tier, which should not happen for strings the
/// extractor produced.
pub fn parse(template_text: &str, markers: &[String]) -> Option<Invocation> {
    let tier = TIERS
        .iter()
        .find(|t| t.name == "template")
        .expect("the template tier is always present in the grammar");
    let mv = tier.pattern.find(template_text, 0)?;

    let name_raw = mv.get_named("name").ok()?.text.clone();
    let name = normalize_name(&name_raw, markers);

    let params = match mv.get_named("params") {
        Ok(item) => parse_params(&item.text, markers),
        Err(_) => IndexMap::new(),
    };

    Some(Invocation { name, params })
}

fn normalize_name(raw: &str, markers: &[String]) -> String {
    let expanded = grammar::expand_markers(raw, markers);
    let underscored = expanded.replace('_', " ");
    let trimmed = strutil::trim(&underscored, strutil::DEFAULT_WHITESPACE);
    let mut name = uppercase_first(trimmed);

    if let Some(rest) = name.strip_prefix("Template:") {
        let trimmed = strutil::trim(rest, strutil::DEFAULT_WHITESPACE);
        name = uppercase_first(trimmed);
    }

    name
}

fn uppercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_params(params_text: &str, markers: &[String]) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let mut positional = 1usize;

    for piece in strutil::split(params_text, "|", None) {
        let (mut key, mut value) = match piece.find('=') {
            Some(eq) if !piece[..eq].ends_with('\n') => {
                (grammar::expand_markers(&piece[..eq], markers), piece[eq + 1..].to_string())
            }
            _ => {
                let key = positional.to_string();
                positional += 1;
                (key, piece.clone())
            }
        };

        value = grammar::expand_markers(&value, markers);
        key = strutil::trim(&key, strutil::DEFAULT_WHITESPACE).to_string();
        value = strutil::trim(&value, strutil::DEFAULT_WHITESPACE).to_string();

        if !key.is_empty() {
            out.insert(key, value);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_normalized_for_underscores_and_case() {
        let inv = parse("{{cite_web|url=http://x}}", &[]).unwrap();
        assert_eq!(inv.name, "Cite web");
    }

    #[test]
    fn template_namespace_prefix_is_stripped_and_renormalized() {
        let inv = parse("{{Template:infobox_person}}", &[]).unwrap();
        assert_eq!(inv.name, "Infobox person");
    }

    #[test]
    fn params_without_equals_are_positional() {
        let inv = parse("{{Cite|a|b|c}}", &[]).unwrap();
        assert_eq!(inv.params.get("1").map(String::as_str), Some("a"));
        assert_eq!(inv.params.get("2").map(String::as_str), Some("b"));
        assert_eq!(inv.params.get("3").map(String::as_str), Some("c"));
    }

    #[test]
    fn mixed_positional_and_named_params_share_one_counter() {
        let inv = parse("{{Cite|a|title=T|b}}", &[]).unwrap();
        assert_eq!(inv.params.get("1").map(String::as_str), Some("a"));
        assert_eq!(inv.params.get("title").map(String::as_str), Some("T"));
        assert_eq!(inv.params.get("2").map(String::as_str), Some("b"));
    }

    #[test]
    fn last_write_wins_on_duplicate_keys() {
        let inv = parse("{{Cite|title=first|title=second}}", &[]).unwrap();
        assert_eq!(inv.params.get("title").map(String::as_str), Some("second"));
    }

    #[test]
    fn trailing_newline_before_equals_makes_it_value_internal() {
        let inv = parse("{{Cite|a\n=b|c}}", &[]).unwrap();
        assert_eq!(inv.params.get("1").map(String::as_str), Some("a\n=b"));
        assert_eq!(inv.params.get("2").map(String::as_str), Some("c"));
    }

    #[test]
    fn markers_in_name_and_values_are_expanded() {
        let markers = vec!["World".to_string()];
        let inv = parse("{{Hello \u{2}0\u{3}|greeting=Hi \u{2}0\u{3}}}", &markers).unwrap();
        assert_eq!(inv.name, "Hello World");
        assert_eq!(inv.params.get("greeting").map(String::as_str), Some("Hi World"));
    }

    #[test]
    fn no_params_produces_empty_map() {
        let inv = parse("{{Stub}}", &[]).unwrap();
        assert!(inv.params.is_empty());
    }
}
