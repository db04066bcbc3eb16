//! A small façade over a PCRE-flavoured regex engine.
//!
//! Patterns are written in the familiar delimited form (`/foo/i`, `!foo!u`, ...)
//! instead of a bare regex body, so that schema files and hard-coded grammar
//! patterns can carry their own modifiers. Matches are returned as value-typed
//! [`MatchVector`]s rather than borrowing from the subject, so callers can hold
//! onto them after the subject string has been dropped or mutated.

mod compile;
mod matchvec;

pub use matchvec::{MatchItem, MatchVector};

use fancy_regex::Regex as InnerRegex;
use indexmap::IndexMap;

/// Errors produced while compiling or using a [`Preg`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pattern did not have a recognised opening/closing delimiter pair.
    #[error("pattern '{0}': no matching closing delimiter")]
    BadDelimiter(String),

    /// A modifier letter following the closing delimiter was not recognised.
    #[error("pattern '{0}': invalid modifier '{1}'")]
    BadModifier(String, char),

    /// The pattern body failed to compile.
    #[error("pattern '{0}': compile error: {1}")]
    Compile(String, fancy_regex::Error),

    /// A capture was requested by index or name that does not exist in this
    /// pattern, or was not populated in a particular match.
    #[error("capture '{0}' is not set")]
    OutOfRange(String),
}

/// A compiled PCRE-delimited pattern.
#[derive(Debug, Clone)]
pub struct Preg {
    re: InnerRegex,
    /// Whether the `A` (anchored) modifier was given: a match is only
    /// attempted at the exact starting offset, never scanned forward.
    anchored: bool,
    /// Capture-group name to 1-based group index (0 is always the whole match).
    names: IndexMap<String, usize>,
}

impl Preg {
    /// Compiles a delimited pattern such as `!\[\[(?P<content>...)\]\]!u`.
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        let compile::Parsed {
            body,
            anchored,
            inline_flags,
        } = compile::parse(pattern)?;

        let full = if inline_flags.is_empty() {
            body
        } else {
            format!("(?{inline_flags}){body}")
        };

        let re = InnerRegex::new(&full)
            .map_err(|err| Error::Compile(pattern.to_string(), err))?;

        let mut names = IndexMap::new();
        for (index, name) in re.capture_names().enumerate() {
            if let Some(name) = name {
                names.insert(name.to_string(), index);
            }
        }

        Ok(Self {
            re,
            anchored,
            names,
        })
    }

    /// Finds at most one match starting at or after `start`.
    ///
    /// Matching errors (for example, catastrophic backtracking limits) are
    /// treated as "no match" rather than propagated, per the façade's
    /// caller-catchable error model.
    pub fn find(&self, subject: &str, start: usize) -> Option<MatchVector> {
        let captures = match self.re.captures_from_pos(subject, start) {
            Ok(Some(captures)) => captures,
            _ => return None,
        };
        let whole = captures.get(0)?;
        if self.anchored && whole.start() != start {
            return None;
        }
        Some(matchvec::build(&captures, &self.names))
    }

    /// Repeatedly matches against `subject`, starting at or after `start`.
    ///
    /// At an empty-length match, advances by one whole `char` before retrying,
    /// matching Perl/PCRE's empty-match advancement rule for UTF-8 subjects.
    pub fn find_all(&self, subject: &str, start: usize) -> Vec<MatchVector> {
        let mut out = Vec::new();
        let mut pos = start;
        while pos <= subject.len() {
            let Some(mv) = self.find(subject, pos) else {
                break;
            };
            let whole = mv.get(0).expect("whole match is always present");
            let (match_start, match_end) = (whole.offset, whole.offset + whole.text.len());
            pos = if match_end == match_start {
                match subject[match_end..].chars().next() {
                    Some(c) => match_end + c.len_utf8(),
                    None => subject.len() + 1,
                }
            } else {
                match_end
            };
            out.push(mv);
        }
        out
    }

    /// Replaces every match of this pattern in `subject` with the literal
    /// `replacement` text (no backreference interpolation).
    pub fn replace(&self, subject: &str, replacement: &str) -> String {
        self.re
            .replace_all(subject, fancy_regex::NoExpand(replacement))
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_offset_and_numeric_offset() {
        let re = Preg::compile(r"!\[\[(?P<content>[^\[\]]*?)\]\]!").unwrap();
        let mv = re.find("Planet [[earth]] is home", 0).unwrap();
        let content = mv.get_named("content").unwrap();
        assert_eq!(content.text, "earth");
        assert_eq!(content.offset, 9);
        let whole = mv.get(0).unwrap();
        assert_eq!(whole.text, "[[earth]]");
        assert_eq!(whole.offset, 7);
    }

    #[test]
    fn invalid_numeric_offset() {
        let re = Preg::compile(r"!\[\[(?P<content>[^\[\]]*?)\]\]!").unwrap();
        let mv = re.find("[[x]]", 0).unwrap();
        assert!(mv.get(20).is_err());
    }

    #[test]
    fn is_set_true_and_false() {
        let re = Preg::compile(r"!\[\[(?P<content>[^\[\]]*?)\]\]!").unwrap();
        let mv = re.find("[[x]]", 0).unwrap();
        assert!(mv.is_set("content"));
        assert!(!mv.is_set("notfound"));
    }

    #[test]
    fn match_all_advances_correctly() {
        let re = Preg::compile(r"!a(b(?:c|d))!").unwrap();
        let matches = re.find_all("abc abd", 0);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get(0).unwrap().text, "abc");
        assert_eq!(matches[0].get(0).unwrap().offset, 0);
        assert_eq!(matches[0].get(1).unwrap().text, "bc");
        assert_eq!(matches[0].get(1).unwrap().offset, 1);
        assert_eq!(matches[1].get(0).unwrap().text, "abd");
        assert_eq!(matches[1].get(0).unwrap().offset, 4);
        assert_eq!(matches[1].get(1).unwrap().text, "bd");
        assert_eq!(matches[1].get(1).unwrap().offset, 5);
    }

    #[test]
    fn missing_ending_delimiter_is_an_error() {
        assert!(Preg::compile("/abc").is_err());
    }

    #[test]
    fn invalid_modifier_is_an_error() {
        assert!(Preg::compile("/abc/Z").is_err());
    }

    #[test]
    fn compile_error_is_an_error() {
        assert!(Preg::compile("/[/").is_err());
    }

    #[test]
    fn replace_is_literal_and_bounded_to_every_match() {
        let re = Preg::compile("/a/").unwrap();
        assert_eq!(re.replace("banana", "o"), "bonono");
    }
}
