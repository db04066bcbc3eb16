//! Value-typed match results.
//!
//! `fancy_regex::Captures` borrows from its subject string, which cannot
//! outlive the template string it scanned. [`MatchVector`] copies out exactly
//! the bytes a caller needs so that match results can be stored (for example,
//! in the marker dictionary) long after the subject has been rewritten.

use super::Error;
use fancy_regex::Captures;
use indexmap::IndexMap;

/// One captured group: its byte offset in the original subject, and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchItem {
    /// Byte offset of this capture within the subject that was matched against.
    pub offset: usize,
    /// The captured text.
    pub text: String,
}

/// An ordered set of captures from a single match, indexed both by position
/// (0 = whole match, 1.. = numbered groups) and by capture name.
#[derive(Debug, Clone)]
pub struct MatchVector {
    items: Vec<Option<MatchItem>>,
    names: IndexMap<String, usize>,
}

impl MatchVector {
    /// Gets a capture by its numeric index. Index 0 is always the whole match.
    pub fn get(&self, index: usize) -> Result<&MatchItem, Error> {
        self.items
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::OutOfRange(index.to_string()))
    }

    /// Gets a capture by its name.
    pub fn get_named(&self, name: &str) -> Result<&MatchItem, Error> {
        let index = self
            .names
            .get(name)
            .ok_or_else(|| Error::OutOfRange(name.to_string()))?;
        self.get(*index)
    }

    /// Whether a named capture participated in this match (a named group
    /// inside an unmatched alternative is "set" in name but absent in value).
    pub fn is_set(&self, name: &str) -> bool {
        self.names
            .get(name)
            .is_some_and(|&index| self.items.get(index).is_some_and(Option::is_some))
    }
}

pub(super) fn build(captures: &Captures<'_>, names: &IndexMap<String, usize>) -> MatchVector {
    let items = (0..captures.len())
        .map(|i| {
            captures.get(i).map(|m| MatchItem {
                offset: m.start(),
                text: m.as_str().to_string(),
            })
        })
        .collect();

    MatchVector {
        items,
        names: names.clone(),
    }
}
