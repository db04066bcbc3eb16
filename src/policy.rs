//! Exclude-list and namespace-filter tables, both loaded from the same
//! sectioned-TSV format: a header line with a non-digit first character
//! names a project section; subsequent digit-leading lines are ids
//! belonging to that project's set.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Errors encountered loading a sectioned-TSV policy file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{1}: I/O error: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("{0}:{1}: id line appears before any project section header")]
    NoSection(PathBuf, usize),

    #[error("{1}:{2}: invalid id: {0}")]
    ParseId(std::num::ParseIntError, PathBuf, usize),
}

/// A project name to a set of ids, as loaded from a sectioned-TSV file.
#[derive(Debug, Clone, Default)]
struct SectionedIds {
    sections: IndexMap<String, HashSet<u32>>,
}

impl SectionedIds {
    fn load(path: &Path) -> Result<Self, Error> {
        let content =
            std::fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_path_buf()))?;

        let mut sections: IndexMap<String, HashSet<u32>> = IndexMap::new();
        let mut current: Option<String> = None;

        for (line_index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let starts_with_digit = trimmed.starts_with(|c: char| c.is_ascii_digit());
            if !starts_with_digit {
                let project = trimmed.to_string();
                sections.entry(project.clone()).or_default();
                current = Some(project);
                continue;
            }

            let Some(project) = &current else {
                return Err(Error::NoSection(path.to_path_buf(), line_index + 1));
            };
            let id: u32 = trimmed
                .parse()
                .map_err(|err| Error::ParseId(err, path.to_path_buf(), line_index + 1))?;
            sections.entry(project.clone()).or_default().insert(id);
        }

        Ok(Self { sections })
    }

    fn contains(&self, project: &str, id: u32) -> bool {
        self.sections.get(project).is_some_and(|ids| ids.contains(&id))
    }
}

/// Per-project set of excluded template ids.
#[derive(Debug, Clone, Default)]
pub struct ExcludeList(SectionedIds);

impl ExcludeList {
    pub fn load(path: &Path) -> Result<Self, Error> {
        Ok(Self(SectionedIds::load(path)?))
    }

    /// An empty exclude list: nothing is excluded. Used when no exclude file
    /// is configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, project: &str, id: u32) -> bool {
        self.0.contains(project, id)
    }
}

/// Per-project set of allowed MediaWiki namespace ids.
#[derive(Debug, Clone, Default)]
pub struct NamespaceFilter(SectionedIds);

impl NamespaceFilter {
    pub fn load(path: &Path) -> Result<Self, Error> {
        Ok(Self(SectionedIds::load(path)?))
    }

    /// A filter that allows only the article namespace (0). Used when no
    /// namespace file is configured.
    pub fn default_article_only() -> Self {
        let mut sections = IndexMap::new();
        sections.insert("enwiki".to_string(), HashSet::from([0]));
        Self(SectionedIds { sections })
    }

    pub fn is_allowed(&self, project: &str, ns: i64) -> bool {
        ns >= 0 && u32::try_from(ns).is_ok_and(|ns| self.0.contains(project, ns))
    }
}

/// Derives the project name from the leading component of a totals output
/// path, up to the literal substring `TemplateTotals`; falls back to
/// `"enwiki"` when the path carries no such filename pattern (including for
/// the `-` stdout spec).
pub fn project_from_totals_path(path: &str) -> String {
    let filename = Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    match filename.find("TemplateTotals") {
        Some(idx) if idx > 0 => filename[..idx].to_string(),
        _ => "enwiki".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wiki-census-policy-test-{}-{}.tsv",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn sections_partition_ids_by_project() {
        let path = write_temp("enwiki\n123\n456\ndewiki\n789\n");
        let exclude = ExcludeList::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(exclude.is_excluded("enwiki", 123));
        assert!(exclude.is_excluded("enwiki", 456));
        assert!(!exclude.is_excluded("enwiki", 789));
        assert!(exclude.is_excluded("dewiki", 789));
    }

    #[test]
    fn id_before_any_section_is_an_error() {
        let path = write_temp("123\n");
        let result = ExcludeList::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::NoSection(..))));
    }

    #[test]
    fn project_is_taken_up_to_the_template_totals_marker() {
        assert_eq!(project_from_totals_path("/data/enwikiTemplateTotals.tsv"), "enwiki");
        assert_eq!(project_from_totals_path("dewikiTemplateTotals.tsv"), "dewiki");
        assert_eq!(project_from_totals_path("-"), "enwiki");
        assert_eq!(project_from_totals_path("totals.tsv"), "enwiki");
    }
}
