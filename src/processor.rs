//! The page processor: for each page, runs the extractor and invocation
//! parser, applies the template schema (alias resolution, validity
//! classification, value validation, exclude-list policy), and emits
//! records.

use crate::driver::PageRecord;
use crate::policy::{ExcludeList, NamespaceFilter};
use crate::registry::{self, Registry, TemplateId, Validity};
use crate::{strutil, wikitext};
use indexmap::IndexMap;
use std::collections::HashSet;

/// The maximum length, in bytes, of an emitted key or value.
const MAX_FIELD_LEN: usize = 255;

/// One emitted record: `id<TAB>page_id(<TAB>key<TAB>value)*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: TemplateId,
    pub page_id: u64,
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Formats this record as a TSV line, without a trailing newline.
    pub fn to_line(&self) -> String {
        let mut line = format!("{}\t{}", self.id, self.page_id);
        for (key, value) in &self.fields {
            line.push('\t');
            line.push_str(key);
            line.push('\t');
            line.push_str(value);
        }
        line
    }
}

/// Processes one page against `registry`, `exclude`, and `namespaces`,
/// calling `emit` once per record produced (spec §4.6).
pub fn process_page(
    page: &PageRecord,
    registry: &mut Registry,
    exclude: &ExcludeList,
    namespaces: &NamespaceFilter,
    project: &str,
    mut emit: impl FnMut(Record),
) {
    if !namespaces.is_allowed(project, page.ns) || page.title.contains("/Archive") {
        return;
    }

    let extraction = wikitext::extract(&page.text);
    let mut pages_counted: HashSet<TemplateId> = HashSet::new();

    for template_text in &extraction.templates {
        let Some(invocation) = wikitext::parse_invocation(template_text, &extraction.markers) else {
            continue;
        };
        let Some(id) = registry.id_for_name(&invocation.name) else {
            continue;
        };

        let resolved = resolve_params(registry.schema(id).expect("id came from the registry"), &invocation.params);
        if resolved.is_empty() {
            continue;
        }

        let schema = registry.schema_mut(id).expect("id came from the registry");
        if pages_counted.insert(id) {
            schema.pagecount += 1;
        }
        schema.instancecount += 1;

        let excluded = exclude.is_excluded(project, id.0);
        let schema_anomaly = excluded && has_schema_anomaly(schema, &resolved);

        let validation_error = resolved.iter().any(|(key, value)| {
            schema
                .params
                .get(key)
                .and_then(|p| registry::validate(&p.validation, value))
                .is_some_and(|ok| !ok)
        });
        if validation_error {
            schema.note_validation_error();
        }

        let emit_record = !excluded || schema_anomaly || validation_error;
        if !emit_record {
            continue;
        }

        let blank_all = excluded;
        let mut fields = Vec::with_capacity(resolved.len());
        for (key, value) in &resolved {
            let was_capped = schema.is_value_cardinality_capped(key);
            schema.record_param_occurrence(key);
            schema.record_param_value(key, value);

            let emitted_value = if blank_all {
                String::new()
            } else if was_capped && !validation_error {
                String::new()
            } else {
                value.clone()
            };

            fields.push((clean_field(key), clean_field(&emitted_value)));
        }

        emit(Record {
            id,
            page_id: page.id,
            fields,
        });
    }
}

/// Drops empty-value params and resolves each remaining key through the
/// alias map, last-write-wins on collision (spec §4.6 steps a-c).
pub(crate) fn resolve_params(
    schema: &registry::TemplateSchema,
    params: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut resolved = IndexMap::new();
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        let canonical = schema.resolve_alias(key);
        resolved.insert(canonical, value.clone());
    }
    resolved
}

/// Whether an excluded template's invocation has a schema anomaly that
/// forces emission: an unknown key, a present deprecated key, or a missing
/// required key.
fn has_schema_anomaly(schema: &registry::TemplateSchema, resolved: &IndexMap<String, String>) -> bool {
    for key in resolved.keys() {
        if !schema.params.contains_key(key) {
            return true;
        }
    }
    for (key, param) in &schema.params {
        match param.validity {
            Validity::Deprecated if resolved.contains_key(key) => return true,
            Validity::Required if !resolved.contains_key(key) => return true,
            _ => {}
        }
    }
    false
}

/// Replaces TAB/LF with SPACE and truncates to [`MAX_FIELD_LEN`] bytes.
fn clean_field(field: &str) -> String {
    let cleaned = strutil::replace(field, "\t", " ", None);
    let cleaned = strutil::replace(&cleaned, "\n", " ", None);
    truncate_bytes(&cleaned, MAX_FIELD_LEN)
}

fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ParamSchema, Validation};

    fn page(ns: i64, title: &str, text: &str) -> PageRecord {
        PageRecord {
            id: 42,
            ns,
            title: title.to_string(),
            revision_id: 1,
            text: text.to_string(),
        }
    }

    fn registry_with(id: u32, rows: &[(&str, &str, &str)]) -> Registry {
        let mut tsv = format!("T\t{id}");
        for (group, validity, validation) in rows {
            tsv.push_str(&format!("\t{group}\t{validity}\t{validation}"));
        }
        tsv.push('\n');
        let path = std::env::temp_dir().join(format!("wiki-census-proc-test-{}.tsv", std::process::id()));
        std::fs::write(&path, tsv).unwrap();
        let registry = Registry::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        registry
    }

    #[test]
    fn archive_pages_are_skipped() {
        let mut registry = registry_with(1, &[("name", "R", "N")]);
        let exclude = ExcludeList::empty();
        let namespaces = NamespaceFilter::default_article_only();
        let mut records = Vec::new();
        process_page(
            &page(0, "Foo/Archive 1", "{{T|name=x}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn empty_value_params_are_dropped_and_record_is_skipped_if_nothing_remains() {
        let mut registry = registry_with(1, &[("name", "R", "N")]);
        let exclude = ExcludeList::empty();
        let namespaces = NamespaceFilter::default_article_only();
        let mut records = Vec::new();
        process_page(
            &page(0, "Foo", "{{T|name=}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );
        assert!(records.is_empty());
        assert_eq!(registry.schema(TemplateId(1)).unwrap().instancecount, 0);
    }

    #[test]
    fn excluded_template_without_anomaly_is_suppressed_but_counted() {
        let mut registry = registry_with(1, &[("name", "R", "N")]);
        let mut exclude_path = std::env::temp_dir();
        exclude_path.push(format!("wiki-census-excl-test-{}.tsv", std::process::id()));
        std::fs::write(&exclude_path, "enwiki\n1\n").unwrap();
        let exclude = ExcludeList::load(&exclude_path).unwrap();
        std::fs::remove_file(&exclude_path).ok();
        let namespaces = NamespaceFilter::default_article_only();

        let mut records = Vec::new();
        process_page(
            &page(0, "Foo", "{{T|name=x}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );

        assert!(records.is_empty());
        let schema = registry.schema(TemplateId(1)).unwrap();
        assert_eq!(schema.pagecount, 1);
        assert_eq!(schema.instancecount, 1);
    }

    #[test]
    fn excluded_template_with_unknown_key_forces_emission_with_blanked_values() {
        let mut registry = registry_with(1, &[("name", "R", "N")]);
        let mut exclude_path = std::env::temp_dir();
        exclude_path.push(format!("wiki-census-excl-test2-{}.tsv", std::process::id()));
        std::fs::write(&exclude_path, "enwiki\n1\n").unwrap();
        let exclude = ExcludeList::load(&exclude_path).unwrap();
        std::fs::remove_file(&exclude_path).ok();
        let namespaces = NamespaceFilter::default_article_only();

        let mut records = Vec::new();
        process_page(
            &page(0, "Foo", "{{T|name=x|mystery=y}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );

        assert_eq!(records.len(), 1);
        for (_, value) in &records[0].fields {
            assert!(value.is_empty());
        }
    }

    #[test]
    fn validation_failure_is_recorded_even_without_exclusion() {
        let mut registry = registry_with(1, &[]);
        let schema = registry.schema_mut(TemplateId(1)).unwrap();
        schema.params.insert(
            "date".to_string(),
            ParamSchema {
                aliases: vec![],
                validity: Validity::Optional,
                validation: Validation::Regex(crate::preg::Preg::compile(r"!^\d{4}-\d{2}-\d{2}$!u").unwrap()),
            },
        );

        let exclude = ExcludeList::empty();
        let namespaces = NamespaceFilter::default_article_only();
        let mut records = Vec::new();
        process_page(
            &page(0, "Foo", "{{T|date=2008/06/01}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(registry.schema(TemplateId(1)).unwrap().validation_error_count, 1);
    }

    #[test]
    fn fields_are_cleaned_and_truncated() {
        let long_value = "x".repeat(300);
        let cleaned = clean_field(&format!("a\tb\nc{long_value}"));
        assert!(!cleaned.contains('\t'));
        assert!(!cleaned.contains('\n'));
        assert_eq!(cleaned.len(), MAX_FIELD_LEN);
    }

    #[test]
    fn the_fiftieth_distinct_value_is_still_emitted_but_the_fifty_first_is_blanked() {
        let mut registry = registry_with(1, &[("v", "O", "N")]);
        let exclude = ExcludeList::empty();
        let namespaces = NamespaceFilter::default_article_only();

        for i in 0..50 {
            let mut records = Vec::new();
            process_page(
                &page(0, "Foo", &format!("{{{{T|v={i}}}}}")),
                &mut registry,
                &exclude,
                &namespaces,
                "enwiki",
                |r| records.push(r),
            );
            assert_eq!(records.len(), 1);
            let value = records[0].fields.iter().find(|(k, _)| k == "v").map(|(_, v)| v.as_str());
            assert_eq!(value, Some(i.to_string().as_str()), "value #{i} (1-indexed {}) should not be blanked", i + 1);
        }

        let mut records = Vec::new();
        process_page(
            &page(0, "Foo", "{{T|v=overflow}}"),
            &mut registry,
            &exclude,
            &namespaces,
            "enwiki",
            |r| records.push(r),
        );
        assert_eq!(records.len(), 1);
        let value = records[0].fields.iter().find(|(k, _)| k == "v").map(|(_, v)| v.as_str());
        assert_eq!(value, Some(""), "the 51st distinct value should be blanked once the set is at cap");
    }
}
