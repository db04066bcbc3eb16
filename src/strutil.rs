//! Small string helpers used throughout the extractor and invocation parser.
//!
//! These mirror a handful of primitives from the original PHP-flavoured tool
//! this crate's behaviour is grounded on: bounded literal replacement, trim
//! against an explicit whitespace set, and bounded splitting with the
//! remainder kept as the final piece.

/// The default whitespace set used by [`trim`].
pub const DEFAULT_WHITESPACE: &str = " \r\n\t";

/// Replaces non-overlapping, left-to-right occurrences of `search` in
/// `subject` with `repl`. `limit` bounds how many replacements are made;
/// `None` means unbounded. An empty `search` is a no-op.
pub fn replace(subject: &str, search: &str, repl: &str, limit: Option<usize>) -> String {
    if search.is_empty() || limit == Some(0) {
        return subject.to_string();
    }

    let mut out = String::with_capacity(subject.len());
    let mut rest = subject;
    let mut count = 0;

    while let Some(pos) = rest.find(search) {
        out.push_str(&rest[..pos]);
        out.push_str(repl);
        rest = &rest[pos + search.len()..];
        count += 1;
        if limit.is_some_and(|limit| count == limit) {
            break;
        }
    }

    out.push_str(rest);
    out
}

/// Trims leading and trailing characters found in `ws` from `subject`.
pub fn trim<'a>(subject: &'a str, ws: &str) -> &'a str {
    subject.trim_matches(|c| ws.contains(c))
}

/// Splits `subject` on `sep`. If `sep` does not occur, returns `[subject]`.
/// Otherwise splits at most `limit - 1` times (i.e. produces at most `limit`
/// pieces), with the remainder of the string as the final piece. `None` means
/// unbounded.
pub fn split(subject: &str, sep: &str, limit: Option<usize>) -> Vec<String> {
    if sep.is_empty() || !subject.contains(sep) {
        return vec![subject.to_string()];
    }

    if limit == Some(1) {
        return vec![subject.to_string()];
    }

    let mut pieces = Vec::new();
    let mut rest = subject;
    loop {
        if limit.is_some_and(|limit| pieces.len() + 1 == limit) {
            break;
        }
        match rest.find(sep) {
            Some(pos) => {
                pieces.push(rest[..pos].to_string());
                rest = &rest[pos + sep.len()..];
            }
            None => break,
        }
    }
    pieces.push(rest.to_string());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_is_idempotent() {
        let s = "  \t hello \r\n ";
        assert_eq!(trim(s, DEFAULT_WHITESPACE), trim(trim(s, DEFAULT_WHITESPACE), DEFAULT_WHITESPACE));
        assert_eq!(trim(s, DEFAULT_WHITESPACE), "hello");
    }

    #[test]
    fn split_join_round_trips_without_a_limit() {
        let s = "a|b||c";
        let pieces = split(s, "|", None);
        assert_eq!(pieces.join("|"), s);
    }

    #[test]
    fn split_with_no_separator_returns_whole_string() {
        assert_eq!(split("abc", "|", None), vec!["abc"]);
    }

    #[test]
    fn split_respects_limit_keeping_remainder_in_last_piece() {
        assert_eq!(
            split("a|b|c|d", "|", Some(2)),
            vec!["a", "b|c|d"]
        );
    }

    #[test]
    fn replace_self_with_self_is_identity() {
        let s = "mississippi";
        assert_eq!(replace(s, "i", "i", None), s);
    }

    #[test]
    fn replace_respects_limit() {
        assert_eq!(replace("aaaa", "a", "b", Some(2)), "bbaa");
    }

    #[test]
    fn replace_is_non_overlapping() {
        assert_eq!(replace("aaa", "aa", "b", None), "ba");
    }
}
