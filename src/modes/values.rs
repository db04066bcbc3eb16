//! `-values`: per-page value dump for one template (identified by any of
//! its name variants), one row per invocation.

use super::TEMPLATE_IDS_PATH;
use crate::driver;
use crate::error::AppError;
use crate::io::{self, Spec};
use crate::processor;
use crate::registry::Registry;
use crate::wikitext;
use std::io::Write;
use std::path::{Path, PathBuf};

const PROGRESS_INTERVAL: u64 = 100_000;

pub fn run(verbose: bool, input: Spec, output_prefix: Spec, names: Vec<String>) -> Result<(), AppError> {
    let registry = Registry::load(Path::new(TEMPLATE_IDS_PATH))?;
    let Some(id) = names.iter().find_map(|name| registry.id_for_name(name)) else {
        log::warn!("values: none of the requested template names are known: {names:?}");
        return Ok(());
    };
    let schema = registry
        .schema(id)
        .expect("id came from the registry we just resolved it against");
    let keys: Vec<String> = schema.params.keys().cloned().collect();

    let reader = io::open_input(&input)?;
    let mut out = create_values_output(&output_prefix, &schema.canonical_name)?;

    writeln!(out, "pagename\ttemplatename\t{}", keys.join("\t"))
        .map_err(|err| AppError::WriteOutput(PathBuf::from(output_prefix.as_str()), err))?;

    let mut pages_seen: u64 = 0;
    driver::run(reader, |page| {
        pages_seen += 1;
        if verbose && pages_seen % PROGRESS_INTERVAL == 0 {
            log::info!("values: processed {pages_seen} pages");
        }

        let extraction = wikitext::extract(&page.text);
        for template_text in &extraction.templates {
            let Some(invocation) = wikitext::parse_invocation(template_text, &extraction.markers) else {
                continue;
            };
            if registry.id_for_name(&invocation.name) != Some(id) {
                continue;
            }
            let resolved = processor::resolve_params(schema, &invocation.params);
            if resolved.is_empty() {
                continue;
            }

            let fields: Vec<&str> = keys
                .iter()
                .map(|key| resolved.get(key).map(String::as_str).unwrap_or(""))
                .collect();
            writeln!(out, "{}\t{}\t{}", page.title, schema.canonical_name, fields.join("\t")).map_err(|err| {
                AppError::WriteOutput(PathBuf::from(output_prefix.as_str()), err)
            })?;
        }
        Ok(())
    })?;

    log::info!("values: finished, {pages_seen} pages processed");
    Ok(())
}

/// Builds the output handle for a prefix spec: stdio is used as-is; a file
/// path has the sanitised template name and a `.tsv` extension appended,
/// matching the `<project>TemplateTotals.tsv` naming convention used
/// elsewhere in this tool's output files.
fn create_values_output(prefix: &Spec, template_name: &str) -> Result<Box<dyn Write>, AppError> {
    match prefix {
        Spec::Stdio => io::create_output(prefix),
        Spec::Path(path) => {
            let filename = format!("{}{}.tsv", path.display(), sanitize(template_name));
            io::create_output(&Spec::Path(PathBuf::from(filename)))
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
