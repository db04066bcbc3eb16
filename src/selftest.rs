//! The embedded self-test suite (`-t`), a runtime-executable companion to
//! the `cargo test` suite: it exercises the seed scenarios this crate's
//! behaviour is grounded on, against a built binary, and reports a single
//! pass/fail verdict instead of a per-test list.

use crate::policy::{ExcludeList, NamespaceFilter};
use crate::preg::Preg;
use crate::processor::{self, Record};
use crate::registry::{ParamSchema, Registry, TemplateId, Validation, Validity};
use crate::{driver, wikitext};
use indexmap::IndexMap;

/// Runs every seed scenario in order, stopping at the first failure.
///
/// Returns `Ok(())` if every scenario passed, or `Err(message)` describing
/// the first one that did not.
pub fn run() -> Result<(), String> {
    test_regex_named_capture()?;
    test_regex_find_all()?;
    test_six_template_extraction()?;
    test_excluded_template_is_suppressed_without_anomaly()?;
    test_alias_resolution_and_empty_value_dropping()?;
    test_regex_validation_forces_emission()?;
    Ok(())
}

fn check(cond: bool, scenario: &str, detail: impl std::fmt::Display) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(format!("{scenario}: {detail}"))
    }
}

fn test_regex_named_capture() -> Result<(), String> {
    let re = Preg::compile(r"!\[\[(?P<content>[^\[\]]*?)\]\]!")
        .map_err(|err| format!("regex named capture: pattern failed to compile: {err}"))?;
    let mv = re
        .find("Planet [[earth]] is home", 0)
        .ok_or("regex named capture: expected a match")?;

    let whole = mv.get(0).map_err(|err| err.to_string())?;
    check(whole.text == "[[earth]]" && whole.offset == 7, "regex named capture", "whole match mismatch")?;

    let content = mv.get_named("content").map_err(|err| err.to_string())?;
    check(content.text == "earth" && content.offset == 9, "regex named capture", "content capture mismatch")
}

fn test_regex_find_all() -> Result<(), String> {
    let re = Preg::compile(r"!a(b(?:c|d))!").map_err(|err| format!("regex find_all: pattern failed to compile: {err}"))?;
    let matches = re.find_all("abc abd", 0);
    check(matches.len() == 2, "regex find_all", "expected 2 matches")?;

    let first_whole = matches[0].get(0).map_err(|err| err.to_string())?;
    let first_cap = matches[0].get(1).map_err(|err| err.to_string())?;
    check(
        first_whole.text == "abc" && first_whole.offset == 0 && first_cap.text == "bc" && first_cap.offset == 1,
        "regex find_all",
        "first match mismatch",
    )?;

    let second_whole = matches[1].get(0).map_err(|err| err.to_string())?;
    let second_cap = matches[1].get(1).map_err(|err| err.to_string())?;
    check(
        second_whole.text == "abd" && second_whole.offset == 4 && second_cap.text == "bd" && second_cap.offset == 5,
        "regex find_all",
        "second match mismatch",
    )
}

const NESTED_PAGE_BODY: &str = "{{Nihongo|Cindy Aurum|シドニー・オールム|Shidonī Ōrumu|'Cidney'<ref name='SilMoogle'/>}} {{Infobox_person|name=[[Fred]] <!-- c -->|birth_date={{birth date|1984|12|13}}}} <ref>{{Cite web|url=http://a.com|title=Website}}</ref> {{sort|ABC}} {{math|''g'' : [[interval (mathematics)#Infinite endpoints|(−∞,+9] or [0,+∞)]] → ℝ}}";

fn test_six_template_extraction() -> Result<(), String> {
    let extraction = wikitext::extract(NESTED_PAGE_BODY);
    check(extraction.templates.len() == 6, "six-template extraction", format!("expected 6 templates, got {}", extraction.templates.len()))?;

    let invocations: Vec<_> = extraction
        .templates
        .iter()
        .map(|t| wikitext::parse_invocation(t, &extraction.markers).expect("every extracted template parses"))
        .collect();

    let names: Vec<&str> = invocations.iter().map(|inv| inv.name.as_str()).collect();
    check(
        names == vec!["Nihongo", "Infobox person", "Birth date", "Cite web", "Sort", "Math"],
        "six-template extraction",
        format!("unexpected name sequence: {names:?}"),
    )?;

    let birth_date = &invocations[2];
    check(
        birth_date.params.get("1").map(String::as_str) == Some("1984")
            && birth_date.params.get("2").map(String::as_str) == Some("12")
            && birth_date.params.get("3").map(String::as_str) == Some("13"),
        "six-template extraction",
        "Birth date positional params mismatch",
    )?;

    let cite_web = &invocations[3];
    check(
        cite_web.params.get("url").map(String::as_str) == Some("http://a.com")
            && cite_web.params.get("title").map(String::as_str) == Some("Website"),
        "six-template extraction",
        "Cite web params mismatch",
    )
}

fn load_exclude_list(rows: &[(&str, &[u32])]) -> ExcludeList {
    let mut tsv = String::new();
    for (project, ids) in rows {
        tsv.push_str(project);
        tsv.push('\n');
        for id in *ids {
            tsv.push_str(&id.to_string());
            tsv.push('\n');
        }
    }
    let path = std::env::temp_dir().join(format!("wiki-census-selftest-excl-{}.tsv", std::process::id()));
    std::fs::write(&path, tsv).expect("temp file is writable");
    let exclude = ExcludeList::load(&path).expect("self-test fixture TSV is well-formed");
    std::fs::remove_file(&path).ok();
    exclude
}

fn load_registry_from_tsv(tsv: &str) -> Registry {
    let path = std::env::temp_dir().join(format!("wiki-census-selftest-{}.tsv", std::process::id()));
    std::fs::write(&path, tsv).expect("temp file is writable");
    let registry = Registry::load(&path).expect("self-test fixture TSV is well-formed");
    std::fs::remove_file(&path).ok();
    registry
}

fn dump_page(text: &str) -> driver::PageRecord {
    driver::PageRecord {
        id: 1,
        ns: 0,
        title: "Test page".to_string(),
        revision_id: 1,
        text: text.to_string(),
    }
}

fn process_one(
    page: &driver::PageRecord,
    registry: &mut Registry,
    exclude: &ExcludeList,
    namespaces: &NamespaceFilter,
) -> Vec<Record> {
    let mut records = Vec::new();
    processor::process_page(page, registry, exclude, namespaces, "enwiki", |record| records.push(record));
    records
}

fn test_excluded_template_is_suppressed_without_anomaly() -> Result<(), String> {
    let mut registry = load_registry_from_tsv("Cite web\t1\turl\tR\tN\ttitle\tR\tN\n");
    let exclude = load_exclude_list(&[("enwiki", &[1])]);
    let namespaces = NamespaceFilter::default_article_only();

    let page = dump_page("{{Cite web|url=http://a.com|title=Website}}");
    let records = process_one(&page, &mut registry, &exclude, &namespaces);

    check(records.is_empty(), "excluded template suppression", "expected zero emitted records")?;
    let schema = registry.schema(TemplateId(1)).expect("schema was just loaded");
    check(
        schema.pagecount == 1 && schema.instancecount == 1,
        "excluded template suppression",
        "counters did not update despite suppression",
    )
}

fn test_alias_resolution_and_empty_value_dropping() -> Result<(), String> {
    let mut registry = load_registry_from_tsv("Infobox musical artist\t2\tname\tO\tN\tbackground|Background\tO\tN\tLabel\tO\tN\n");
    let exclude = ExcludeList::empty();
    let namespaces = NamespaceFilter::default_article_only();

    let page = dump_page("{{Infobox musical artist|name=X|Background=solo_singer|First album=|Label=Y}}");
    let records = process_one(&page, &mut registry, &exclude, &namespaces);

    check(records.len() == 1, "alias resolution and empty-value dropping", "expected exactly one record")?;
    let fields: IndexMap<&str, &str> = records[0]
        .fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    check(!fields.contains_key("First album") && !fields.contains_key("first album"), "alias resolution and empty-value dropping", "empty-valued param was not dropped")?;
    check(fields.get("name") == Some(&"X"), "alias resolution and empty-value dropping", "name param missing or wrong")?;
    check(fields.get("background") == Some(&"solo_singer"), "alias resolution and empty-value dropping", "aliased background param missing or wrong")?;
    check(fields.get("Label") == Some(&"Y"), "alias resolution and empty-value dropping", "Label param missing or wrong")
}

fn test_regex_validation_forces_emission() -> Result<(), String> {
    let mut registry = load_registry_from_tsv("Birth date\t3\n");
    {
        let schema = registry.schema_mut(TemplateId(3)).expect("schema was just loaded");
        let pattern = Preg::compile(r"!^\d{4}-\d{2}-\d{2}$!u").expect("fixture regex is valid");
        schema.params.insert(
            "date".to_string(),
            ParamSchema {
                aliases: vec![],
                validity: Validity::Optional,
                validation: Validation::Regex(pattern),
            },
        );
    }
    let exclude = load_exclude_list(&[("enwiki", &[3])]);
    let namespaces = NamespaceFilter::default_article_only();

    let good_page = dump_page("{{Birth date|date=2008-06-01}}");
    let good_records = process_one(&good_page, &mut registry, &exclude, &namespaces);
    check(good_records.is_empty(), "regex validation forces emission", "a valid date should stay suppressed under exclusion")?;

    let bad_page = dump_page("{{Birth date|date=2008/06/01}}");
    let bad_records = process_one(&bad_page, &mut registry, &exclude, &namespaces);
    check(bad_records.len() == 1, "regex validation forces emission", "an invalid date should force emission despite exclusion")?;

    let schema = registry.schema(TemplateId(3)).expect("schema was just loaded");
    check(schema.validation_error_count == 1, "regex validation forces emission", "validation error was not counted")
}
