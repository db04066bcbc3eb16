//! Parses the delimited-pattern-plus-modifiers syntax into a plain regex body
//! and an inline flag prefix understood by `fancy_regex`.

use super::Error;

/// The result of splitting a delimited pattern into its parts.
pub(super) struct Parsed {
    /// The regex body, with delimiters stripped.
    pub body: String,
    /// Whether the `A` modifier (anchored) was present.
    pub anchored: bool,
    /// Inline flag letters understood by `fancy_regex`, e.g. `"im"`.
    pub inline_flags: String,
}

/// Modifier letters that are recognised but have no `fancy_regex` equivalent:
/// they are accepted for compatibility with schema files written against the
/// original PCRE-based tool, but have no effect on matching behaviour.
const ADVISORY_ONLY: &[char] = &['A', 'D', 'S', 'X', 'J'];

/// Modifier letters that map directly onto a `fancy_regex` inline flag.
const DIRECT_FLAGS: &[(char, char)] = &[
    ('i', 'i'),
    ('m', 'm'),
    ('s', 's'),
    ('x', 'x'),
    ('U', 'U'),
    // `u` (UTF-8 + Unicode properties) is `fancy_regex`'s default behaviour
    // for `&str` subjects, so it is accepted but does not need a flag letter.
];

pub(super) fn parse(pattern: &str) -> Result<Parsed, Error> {
    if pattern.len() < 3 {
        return Err(Error::BadDelimiter(pattern.to_string()));
    }

    let start_delim = pattern.chars().next().expect("checked length above");
    let end_delim = match start_delim {
        '(' | ')' => ')',
        '{' | '}' => '}',
        '[' | ']' => ']',
        '<' | '>' => '>',
        other => other,
    };

    let end_pos = pattern.rfind(end_delim).filter(|&pos| pos > 0);
    let Some(end_pos) = end_pos else {
        return Err(Error::BadDelimiter(pattern.to_string()));
    };

    let mods = &pattern[end_pos + start_delim.len_utf8()..];
    let mut anchored = false;
    let mut inline_flags = String::new();

    for c in mods.chars() {
        if c == ' ' || c == '\n' {
            continue;
        }
        if c == 'A' {
            anchored = true;
            continue;
        }
        if c == 'u' {
            continue;
        }
        if ADVISORY_ONLY.contains(&c) {
            continue;
        }
        if let Some(&(_, flag)) = DIRECT_FLAGS.iter().find(|&&(m, _)| m == c) {
            inline_flags.push(flag);
            continue;
        }
        return Err(Error::BadModifier(pattern.to_string(), c));
    }

    let body_start = start_delim.len_utf8();
    let body = pattern[body_start..end_pos].to_string();

    Ok(Parsed {
        body,
        anchored,
        inline_flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_identical_delimiters_and_modifiers() {
        let parsed = parse("!abc!i").unwrap();
        assert_eq!(parsed.body, "abc");
        assert_eq!(parsed.inline_flags, "i");
    }

    #[test]
    fn supports_bracket_delimiter_pairs() {
        let parsed = parse("(abc)").unwrap();
        assert_eq!(parsed.body, "abc");
    }

    #[test]
    fn rejects_unknown_modifier() {
        assert!(matches!(parse("/abc/Z"), Err(Error::BadModifier(_, 'Z'))));
    }

    #[test]
    fn rejects_missing_closing_delimiter() {
        assert!(parse("/abc").is_err());
    }
}
