//! The precedence-ordered nested-construct grammar and the preprocessing
//! patterns the extractor runs before it.
//!
//! Every pattern here is carried over verbatim (translated into the `preg`
//! façade's delimiter syntax) from the template-extraction tool this crate's
//! behaviour is grounded on, since the exact character classes matter for
//! byte-for-byte compatible extraction.

use crate::preg::Preg;
use std::sync::LazyLock;

/// One precedence tier of the nested-construct grammar.
pub struct Tier {
    /// The tier's name; also used as the discriminant for "is this a
    /// template invocation" when walking matches.
    pub name: &'static str,
    /// The compiled pattern for this tier. Every tier pattern defines a
    /// `content` capture used both for the nested-container test and (for
    /// non-template tiers) as the payload stored for later marker expansion.
    pub pattern: Preg,
}

/// The grammar's six tiers, highest precedence first.
pub static TIERS: LazyLock<Vec<Tier>> = LazyLock::new(|| {
    vec![
        Tier {
            name: "passed_param",
            pattern: Preg::compile(r"!\{\{\{(?P<content>[^{}]*?\}\}\})!")
                .expect("passed_param pattern is valid"),
        },
        Tier {
            name: "htmlstub",
            pattern: Preg::compile(
                r#"!<\s*(?P<content>[\w]+(?:(?:\s+\w+(?:\s*=\s*(?:"[^"]*+"|'[^']*+'|[^'">\s]+))?)+\s*|\s*)/>)!"#,
            )
            .expect("htmlstub pattern is valid"),
        },
        Tier {
            name: "html",
            pattern: Preg::compile(r"!<\s*(?P<tag>[\w]+)[^>]*>(?P<content>.*?<\s*/\s*(?P=tag)\s*>)!s")
                .expect("html pattern is valid"),
        },
        Tier {
            name: "template",
            pattern: Preg::compile(
                r"!\{\{\s*(?P<content>(?P<name>[^{}\|]+?)(?:\|(?P<params>[^{}]+?))?\}\})!",
            )
            .expect("template pattern is valid"),
        },
        Tier {
            name: "table",
            pattern: Preg::compile(r"!\{\|(?P<content>[^{]*?\|\})!").expect("table pattern is valid"),
        },
        Tier {
            name: "link",
            pattern: Preg::compile(r"/\[\[(?P<content>(?:.(?!\[\[))+?\]\])/s")
                .expect("link pattern is valid"),
        },
    ]
});

/// Strips HTML comments before the main grammar runs.
pub static COMMENT: LazyLock<Preg> =
    LazyLock::new(|| Preg::compile("/<!--.*?-->/us").expect("comment pattern is valid"));

/// Strips `<nowiki>...</nowiki>` spans before the main grammar runs.
pub static NOWIKI: LazyLock<Preg> = LazyLock::new(|| {
    Preg::compile(r"!<\s*nowiki\s*>.*?<\s*/nowiki\s*>!usi").expect("nowiki pattern is valid")
});

/// Collapses `<br>`/`<br/>`/`<br />` into a single space before the main
/// grammar runs.
pub static BR: LazyLock<Preg> =
    LazyLock::new(|| Preg::compile(r"!<\s*br\s*/?\s*>!usi").expect("br pattern is valid"));

/// The two bytes the marker token is built from. Both are ASCII control
/// characters (never a continuation byte of a multi-byte UTF-8 scalar), so
/// scanning for them at the byte level is safe on any `&str`.
const MARKER_START: u8 = 0x02;
const MARKER_END: u8 = 0x03;

/// Whether any grammar tier matches somewhere inside `text`. Used to decide
/// whether a candidate match still has an unreduced nested construct inside
/// it, and so must be left alone until a later pass.
pub fn has_nested_construct(text: &str) -> bool {
    TIERS.iter().any(|tier| tier.pattern.find(text, 0).is_some())
}

/// Builds the marker token text for a given marker id.
pub fn marker_token(id: usize) -> String {
    format!("\u{2}{id}\u{3}")
}

/// Strips any stray marker-delimiter bytes from input page text before
/// extraction begins, per spec's invariant that these two bytes are
/// forbidden in well-formed input so that synthetic markers can never
/// collide with it.
pub fn strip_marker_bytes(text: &str) -> String {
    let bytes = text.as_bytes();
    if memchr::memchr2(MARKER_START, MARKER_END, bytes).is_none() {
        return text.to_string();
    }
    text.chars()
        .filter(|&c| c != MARKER_START as char && c != MARKER_END as char)
        .collect()
}

/// Expands every marker in `text` using `dictionary`, where `dictionary[i]`
/// is the fully-resolved expansion of marker id `i`. Because dictionary
/// entries are themselves always marker-free (invariant of the extractor), a
/// single left-to-right substitution pass fully reifies `text`. Scans for the
/// marker-start byte with `memchr`, in the same single-byte-sentinel style
/// `common.rs::decode_html` uses for HTML entity scanning.
pub fn expand_markers(text: &str, dictionary: &[String]) -> String {
    let bytes = text.as_bytes();
    if memchr::memchr(MARKER_START, bytes).is_none() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut flushed = 0;
    for start in memchr::memchr_iter(MARKER_START, bytes) {
        if start < flushed {
            continue;
        }
        let digits_start = start + 1;
        let Some(rel_end) = memchr::memchr(MARKER_END, &bytes[digits_start..]) else {
            continue;
        };
        let digits = &text[digits_start..digits_start + rel_end];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(id) = digits.parse::<usize>() else {
            continue;
        };

        out.push_str(&text[flushed..start]);
        if let Some(expansion) = dictionary.get(id) {
            out.push_str(expansion);
        }
        flushed = digits_start + rel_end + 1;
    }
    out.push_str(&text[flushed..]);
    out
}

#[cfg(test)]
mod marker_tests {
    use super::*;

    #[test]
    fn strip_marker_bytes_is_a_no_op_when_absent() {
        assert_eq!(strip_marker_bytes("plain text"), "plain text");
    }

    #[test]
    fn strip_marker_bytes_removes_stray_control_bytes() {
        let input = format!("a{}b{}c", MARKER_START as char, MARKER_END as char);
        assert_eq!(strip_marker_bytes(&input), "abc");
    }

    #[test]
    fn expand_markers_resolves_multiple_markers_in_order() {
        let dictionary = vec!["first".to_string(), "second".to_string()];
        let text = format!("{}0{} and {}1{}", MARKER_START as char, MARKER_END as char, MARKER_START as char, MARKER_END as char);
        assert_eq!(expand_markers(&text, &dictionary), "first and second");
    }

    #[test]
    fn expand_markers_leaves_malformed_tokens_untouched() {
        let text = format!("{}notdigits{}", MARKER_START as char, MARKER_END as char);
        assert_eq!(expand_markers(&text, &[]), text);
    }
}
