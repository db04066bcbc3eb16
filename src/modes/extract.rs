//! The default mode: stream a dump, extract and validate template
//! invocations, and write the records and totals streams.

use super::{load_exclude_list, load_namespace_filter, EXCLUDE_TEMPLATES_PATH, NAMESPACES_PATH, TEMPLATE_IDS_PATH};
use crate::error::AppError;
use crate::io::{self, Spec};
use crate::policy;
use crate::processor::{self, Record};
use crate::registry::Registry;
use crate::driver;
use std::io::Write;
use std::path::Path;

/// How often, in pages, a progress marker is logged when `-v` is given.
const PROGRESS_INTERVAL: u64 = 100_000;

pub fn run(verbose: bool, input: Spec, output: Spec, totals: Spec) -> Result<(), AppError> {
    let mut registry = Registry::load(Path::new(TEMPLATE_IDS_PATH))?;
    let exclude = load_exclude_list(Path::new(EXCLUDE_TEMPLATES_PATH))?;
    let namespaces = load_namespace_filter(Path::new(NAMESPACES_PATH))?;
    let project = policy::project_from_totals_path(totals.as_str());

    let reader = io::open_input(&input)?;
    let mut out = io::create_output(&output)?;

    let mut pages_seen: u64 = 0;
    driver::run(reader, |page| {
        pages_seen += 1;
        if verbose && pages_seen % PROGRESS_INTERVAL == 0 {
            log::info!("extract: processed {pages_seen} pages");
        }

        let mut write_err = None;
        processor::process_page(&page, &mut registry, &exclude, &namespaces, &project, |record| {
            if write_err.is_none() {
                write_err = write_record(out.as_mut(), &record).err();
            }
        });
        match write_err {
            Some(err) => Err(AppError::WriteOutput(Path::new(output.as_str()).to_path_buf(), err)),
            None => Ok(()),
        }
    })?;

    let mut totals_out = io::create_output(&totals)?;
    registry
        .write_totals(totals_out.as_mut())
        .map_err(|err| AppError::WriteOutput(Path::new(totals.as_str()).to_path_buf(), err))?;

    log::info!("extract: finished, {pages_seen} pages processed");
    Ok(())
}

fn write_record(out: &mut dyn Write, record: &Record) -> std::io::Result<()> {
    writeln!(out, "{}", record.to_line())
}
