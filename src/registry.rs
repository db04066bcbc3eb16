//! The template registry: declared templates, their parameter schemas, and
//! the running per-template counters accumulated while processing pages.

use crate::preg::{self, Preg};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A template is identified by a small positive integer assigned by the
/// schema file, not by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(pub u32);

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parameter's validity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Required,
    Suggested,
    Deprecated,
    Optional,
}

impl Validity {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "R" => Some(Self::Required),
            "S" => Some(Self::Suggested),
            "D" => Some(Self::Deprecated),
            "O" => Some(Self::Optional),
            _ => None,
        }
    }
}

/// A parameter's value-validation classification.
#[derive(Debug, Clone)]
pub enum Validation {
    /// No value checking.
    None,
    /// Value must be a recognised yes/no token (case-insensitive).
    YesNo,
    /// Value must fully match a compiled regex.
    Regex(Preg),
    /// Value must be a member of an enumerated set.
    Enumerated(HashSet<String>),
}

/// The recognised yes/no tokens for [`Validation::YesNo`], lower-cased.
const YES_NO_TOKENS: &[&str] = &["yes", "y", "true", "1", "no", "n", "false", "0"];

/// The schema for a single parameter, keyed by its canonical name.
#[derive(Debug, Clone)]
pub struct ParamSchema {
    pub aliases: Vec<String>,
    pub validity: Validity,
    pub validation: Validation,
}

/// A per-value-cardinality cap: once a parameter has this many distinct
/// observed values, its value distribution is frozen.
const VALUE_CARDINALITY_CAP: usize = 50;

/// A per-template cap on how many validation-error occurrences are counted.
const VALIDATION_ERROR_CAP: u64 = 10_000;

/// Everything the registry tracks for one template id.
#[derive(Debug, Clone)]
pub struct TemplateSchema {
    pub canonical_name: String,
    pub params: IndexMap<String, ParamSchema>,
    alias_index: HashMap<String, String>,
    has_named_schema_row: bool,

    pub pagecount: u64,
    pub instancecount: u64,
    param_occurrence: IndexMap<String, u64>,
    param_value_cnt: IndexMap<String, IndexMap<String, u64>>,
    pub validation_error_count: u64,
}

impl TemplateSchema {
    fn new(name: String) -> Self {
        Self {
            canonical_name: name,
            params: IndexMap::new(),
            alias_index: HashMap::new(),
            has_named_schema_row: false,
            pagecount: 0,
            instancecount: 0,
            param_occurrence: IndexMap::new(),
            param_value_cnt: IndexMap::new(),
            validation_error_count: 0,
        }
    }

    /// Resolves a raw parameter key to its canonical form, or returns the key
    /// unchanged if it is not known to this template's schema (the caller
    /// uses the latter to detect unknown keys).
    pub fn resolve_alias(&self, key: &str) -> String {
        self.alias_index
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Whether a key's distinct-value set has already reached the cardinality
    /// cap.
    pub fn is_value_cardinality_capped(&self, key: &str) -> bool {
        self.param_value_cnt
            .get(key)
            .is_some_and(|values| values.len() >= VALUE_CARDINALITY_CAP)
    }

    /// Records one occurrence of `key` in an emitted record.
    pub fn record_param_occurrence(&mut self, key: &str) {
        *self.param_occurrence.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Records one occurrence of `value` for `key`, while the distinct-value
    /// set for `key` is still under the cardinality cap.
    pub fn record_param_value(&mut self, key: &str, value: &str) {
        let values = self
            .param_value_cnt
            .entry(key.to_string())
            .or_insert_with(IndexMap::new);
        if values.len() < VALUE_CARDINALITY_CAP {
            *values.entry(value.to_string()).or_insert(0) += 1;
        }
    }

    /// Records a validation failure, up to the per-template cap.
    pub fn note_validation_error(&mut self) {
        if self.validation_error_count < VALIDATION_ERROR_CAP {
            self.validation_error_count += 1;
        }
    }
}

/// Validates `value` against `validation`. `None` means the validation class
/// performs no checking.
pub fn validate(validation: &Validation, value: &str) -> Option<bool> {
    match validation {
        Validation::None => None,
        Validation::YesNo => {
            let lower = value.to_lowercase();
            Some(YES_NO_TOKENS.contains(&lower.as_str()))
        }
        Validation::Regex(re) => Some(re.find(value, 0).is_some()),
        Validation::Enumerated(set) => Some(set.contains(value)),
    }
}

/// Errors encountered loading the template schema file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{1}: I/O error: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("{0}:{1}: {2}")]
    Malformed(PathBuf, usize, String),

    #[error("{1}:{2}: invalid template id: {0}")]
    ParseId(std::num::ParseIntError, PathBuf, usize),

    #[error("{1}:{2}: invalid validation regex: {0}")]
    Pattern(preg::Error, PathBuf, usize),
}

/// The loaded template registry, plus the per-template counters accumulated
/// over the run.
#[derive(Debug, Clone)]
pub struct Registry {
    schemas: IndexMap<TemplateId, TemplateSchema>,
    names: IndexMap<String, TemplateId>,
}

impl Registry {
    /// Loads a `TemplateIds.tsv`-style schema file: `name<TAB>id[<TAB>alias-
    /// group<TAB>validity<TAB>validation[<TAB>arg]]*`, one row per template
    /// name variant (multiple rows may map to the same id).
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content =
            std::fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_path_buf()))?;

        let mut registry = Registry {
            schemas: IndexMap::new(),
            names: IndexMap::new(),
        };

        for (line_index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            registry.load_line(path, line_index + 1, line)?;
        }

        Ok(registry)
    }

    fn load_line(&mut self, path: &Path, line_no: usize, line: &str) -> Result<(), Error> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(Error::Malformed(
                path.to_path_buf(),
                line_no,
                "expected at least a name and an id column".to_string(),
            ));
        }

        let name = fields[0].to_string();
        let id = TemplateId(
            fields[1]
                .parse()
                .map_err(|err| Error::ParseId(err, path.to_path_buf(), line_no))?,
        );

        self.names.entry(name.clone()).or_insert(id);
        let schema = self
            .schemas
            .entry(id)
            .or_insert_with(|| TemplateSchema::new(name.clone()));

        let mut rest = fields[2..].iter();
        let mut carried_schema = false;

        while let Some(&alias_group) = rest.next() {
            let validity_raw = rest.next().ok_or_else(|| {
                Error::Malformed(path.to_path_buf(), line_no, "alias group missing validity class".to_string())
            })?;
            let validation_raw = rest.next().ok_or_else(|| {
                Error::Malformed(
                    path.to_path_buf(),
                    line_no,
                    "alias group missing validation class".to_string(),
                )
            })?;

            let validity = Validity::parse(validity_raw).ok_or_else(|| {
                Error::Malformed(
                    path.to_path_buf(),
                    line_no,
                    format!("unknown validity class '{validity_raw}'"),
                )
            })?;

            let validation = match *validation_raw {
                "N" => Validation::None,
                "Y" => Validation::YesNo,
                "R" => {
                    let arg = rest.next().ok_or_else(|| {
                        Error::Malformed(
                            path.to_path_buf(),
                            line_no,
                            "R validation class requires an argument".to_string(),
                        )
                    })?;
                    let pattern = format!("!^{arg}$!u");
                    Validation::Regex(
                        Preg::compile(&pattern).map_err(|err| Error::Pattern(err, path.to_path_buf(), line_no))?,
                    )
                }
                "V" => {
                    let arg = rest.next().ok_or_else(|| {
                        Error::Malformed(
                            path.to_path_buf(),
                            line_no,
                            "V validation class requires an argument".to_string(),
                        )
                    })?;
                    Validation::Enumerated(arg.split('|').map(str::to_string).collect())
                }
                other => {
                    return Err(Error::Malformed(
                        path.to_path_buf(),
                        line_no,
                        format!("unknown validation class '{other}'"),
                    ));
                }
            };

            let mut group_names = alias_group.split('|');
            let canonical = group_names.next().filter(|s| !s.is_empty()).ok_or_else(|| {
                Error::Malformed(path.to_path_buf(), line_no, "empty alias group".to_string())
            })?;
            let aliases: Vec<String> = group_names.map(str::to_string).collect();

            schema.alias_index.insert(canonical.to_string(), canonical.to_string());
            for alias in &aliases {
                schema.alias_index.insert(alias.clone(), canonical.to_string());
            }
            schema.params.insert(
                canonical.to_string(),
                ParamSchema {
                    aliases,
                    validity,
                    validation,
                },
            );
            carried_schema = true;
        }

        if carried_schema && !schema.has_named_schema_row {
            schema.canonical_name = name;
            schema.has_named_schema_row = true;
        }

        Ok(())
    }

    /// Resolves a name (any known variant) to its template id.
    pub fn id_for_name(&self, name: &str) -> Option<TemplateId> {
        self.names.get(name).copied()
    }

    pub fn schema(&self, id: TemplateId) -> Option<&TemplateSchema> {
        self.schemas.get(&id)
    }

    pub fn schema_mut(&mut self, id: TemplateId) -> Option<&mut TemplateSchema> {
        self.schemas.get_mut(&id)
    }

    /// Writes the totals stream (spec §4.7): one `T` line and a run of `P`
    /// lines per template with at least one page recorded.
    pub fn write_totals(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (id, schema) in &self.schemas {
            if schema.pagecount == 0 {
                continue;
            }
            writeln!(
                out,
                "T{id}\t{}\t{}\t{}",
                schema.pagecount, schema.instancecount, schema.canonical_name
            )?;

            for (key, occurrences) in &schema.param_occurrence {
                write!(out, "P{key}\t{occurrences}")?;
                if !schema.is_value_cardinality_capped(key) {
                    if let Some(values) = schema.param_value_cnt.get(key) {
                        for (value, count) in values {
                            write!(out, "\t{value}\t{count}")?;
                        }
                    }
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(tsv: &str) -> Registry {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("wiki-census-test-{}.tsv", std::process::id()));
        std::fs::write(&path, tsv).unwrap();
        let registry = Registry::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        registry
    }

    #[test]
    fn name_variants_map_to_one_id() {
        let registry = load_str("Cite web\t1\nCite Web\t1\n");
        assert_eq!(registry.id_for_name("Cite web"), Some(TemplateId(1)));
        assert_eq!(registry.id_for_name("Cite Web"), Some(TemplateId(1)));
    }

    #[test]
    fn canonical_name_comes_from_the_schema_carrying_row() {
        let registry = load_str("Cite web\t1\nCite Web\t1\turl|URL\tR\tN\n");
        let schema = registry.schema(TemplateId(1)).unwrap();
        assert_eq!(schema.canonical_name, "Cite Web");
        assert_eq!(schema.resolve_alias("URL"), "url");
    }

    #[test]
    fn value_cardinality_freezes_at_fifty() {
        let mut schema = TemplateSchema::new("T".to_string());
        for i in 0..60 {
            schema.record_param_value("k", &i.to_string());
        }
        assert!(schema.is_value_cardinality_capped("k"));
        assert_eq!(schema.param_value_cnt.get("k").unwrap().len(), VALUE_CARDINALITY_CAP);
    }

    #[test]
    fn validation_error_count_freezes_at_ten_thousand() {
        let mut schema = TemplateSchema::new("T".to_string());
        for _ in 0..(VALIDATION_ERROR_CAP + 5) {
            schema.note_validation_error();
        }
        assert_eq!(schema.validation_error_count, VALIDATION_ERROR_CAP);
    }

    #[test]
    fn yes_no_validation_accepts_known_tokens() {
        assert_eq!(validate(&Validation::YesNo, "Yes"), Some(true));
        assert_eq!(validate(&Validation::YesNo, "0"), Some(true));
        assert_eq!(validate(&Validation::YesNo, "maybe"), Some(false));
    }

    #[test]
    fn regex_validation_requires_full_match() {
        let re = Preg::compile(r"!^\d{4}-\d{2}-\d{2}$!u").unwrap();
        let validation = Validation::Regex(re);
        assert_eq!(validate(&validation, "2008-06-01"), Some(true));
        assert_eq!(validate(&validation, "2008/06/01"), Some(false));
    }
}
