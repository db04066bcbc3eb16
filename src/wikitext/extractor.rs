//! The fixed-point, marker-based nested-construct extractor.
//!
//! This is the heart of the crate: it walks a page body and reduces every
//! nested bracket/tag construct — template invocations, tables, links,
//! HTML tags, triple-brace parameter references — to a flat sequence of
//! synthetic markers, bottom-up, without a recursive-descent grammar.

use super::grammar::{self, TIERS};

/// An iteration ceiling far above what any real page should need; it exists
/// purely as a backstop against pathological input, not as a normal
/// operating limit.
const MAX_ITERATIONS: u32 = 1000;

/// The result of reducing a page body to markers.
pub struct Extraction {
    /// Every top-level `{{...}}` template invocation found, in left-to-right
    /// textual order, each fully reduced (its interior already marker-ized).
    pub templates: Vec<String>,
    /// The marker dictionary: `markers[id]` is the fully marker-free
    /// expansion of marker id `id`.
    pub markers: Vec<String>,
    /// Whether the iteration ceiling was hit before reaching a fixed point.
    /// Callers should treat `templates`/`markers` as a partial result in
    /// that case rather than an error.
    pub truncated: bool,
}

/// Reduces `body` to its flat template/marker representation.
pub fn extract(body: &str) -> Extraction {
    let mut data = preprocess(body);
    let mut markers: Vec<String> = Vec::new();
    let mut templates: Vec<String> = Vec::new();
    let mut truncated = true;

    for _ in 0..MAX_ITERATIONS {
        let mut replaced_any = false;

        for tier in TIERS.iter() {
            let matches = tier.pattern.find_all(&data, 0);
            if matches.is_empty() {
                continue;
            }

            let mut offset_adjust: isize = 0;
            for m in &matches {
                let Ok(content) = m.get_named("content") else {
                    continue;
                };
                if grammar::has_nested_construct(&content.text) {
                    continue;
                }

                let whole = m.get(0).expect("whole match is always present");
                let real_offset = (whole.offset as isize - offset_adjust) as usize;
                let real_end = real_offset + whole.text.len();

                let marker_id = markers.len();
                let expanded = grammar::expand_markers(&whole.text, &markers);
                markers.push(expanded);

                let token = grammar::marker_token(marker_id);
                offset_adjust += whole.text.len() as isize - token.len() as isize;
                data.replace_range(real_offset..real_end, &token);

                if tier.name == "template" {
                    templates.push(whole.text.clone());
                }
                replaced_any = true;
            }
        }

        if !replaced_any {
            truncated = false;
            break;
        }
    }

    Extraction {
        templates,
        markers,
        truncated,
    }
}

fn preprocess(body: &str) -> String {
    let stripped = grammar::strip_marker_bytes(body);
    let stripped = grammar::COMMENT.replace(&stripped, "");
    let stripped = grammar::NOWIKI.replace(&stripped, "");
    grammar::BR.replace(&stripped, " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_template_is_extracted() {
        let extraction = extract("See {{Cite web|url=http://example.com|title=Example}} for details.");
        assert_eq!(extraction.templates.len(), 1);
        assert_eq!(
            extraction.templates[0],
            "{{Cite web|url=http://example.com|title=Example}}"
        );
        assert!(!extraction.truncated);
    }

    #[test]
    fn nested_template_resolves_inner_first() {
        let extraction = extract("{{Outer|a={{Inner|x=1}}|b=2}}");
        assert_eq!(extraction.templates.len(), 2);
        assert_eq!(extraction.templates[0], "{{Inner|x=1}}");
        assert!(extraction.templates[1].starts_with("{{Outer|a="));
        assert!(extraction.templates[1].contains("\u{2}0\u{3}"));
        assert_eq!(extraction.markers[0], "{{Inner|x=1}}");
    }

    #[test]
    fn html_tag_is_absorbed_before_template_boundary() {
        let extraction = extract("{{Cite|quote=<ref>see {{Other}}</ref>|x=1}}");
        assert_eq!(extraction.templates.len(), 2);
        assert_eq!(extraction.templates[0], "{{Other}}");
    }

    #[test]
    fn comments_and_nowiki_and_br_are_stripped_before_the_grammar_runs() {
        let extraction = extract("{{T|a=x<!-- c -->y|b=<nowiki>{{Z}}</nowiki>|c=line1<br>line2}}");
        assert_eq!(extraction.templates.len(), 1);
        assert!(extraction.templates[0].contains("xy"));
        assert!(extraction.templates[0].contains("line1 line2"));
        assert!(!extraction.templates[0].contains("{{Z}}"));
    }

    #[test]
    fn link_tier_is_lowest_precedence() {
        let extraction = extract("[[File:{{Name}}|thumb]]");
        assert_eq!(extraction.templates.len(), 1);
        assert_eq!(extraction.templates[0], "{{Name}}");
    }

    #[test]
    fn table_without_templates_produces_no_templates() {
        let extraction = extract("{|\n| cell1 || cell2\n|}");
        assert!(extraction.templates.is_empty());
        assert_eq!(extraction.markers.len(), 1);
    }

    #[test]
    fn passed_param_is_reduced_before_the_enclosing_template() {
        let extraction = extract("{{T|a={{{1|default}}}}}");
        assert_eq!(extraction.templates.len(), 1);
        assert!(extraction.templates[0].contains("\u{2}0\u{3}"));
        assert_eq!(extraction.markers[0], "{{{1|default}}}");
    }
}
