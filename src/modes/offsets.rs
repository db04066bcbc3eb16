//! `-offsets`: consumes a records stream sorted by template id and emits,
//! for each run of equal ids, the byte offset of the run's first line.
//!
//! The records stream carries no exclusion information of its own, so
//! exclusion here is re-derived the same way the default mode derives its
//! project name: from the output path, via
//! [`crate::policy::project_from_totals_path`]. This mode has no CLI slot
//! for an explicit project argument, so that derivation is reused as the
//! most consistent source of a project name available to it.

use super::{load_exclude_list, EXCLUDE_TEMPLATES_PATH};
use crate::error::AppError;
use crate::io::{self, Spec};
use crate::policy;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub fn run(input: Spec, output: Spec) -> Result<(), AppError> {
    let exclude = load_exclude_list(Path::new(EXCLUDE_TEMPLATES_PATH))?;
    let project = policy::project_from_totals_path(output.as_str());

    let mut reader = io::open_input(&input)?;
    let mut out = io::create_output(&output)?;

    let mut offset: u64 = 0;
    let mut current: Option<(u32, u64)> = None;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .map_err(|err| AppError::Read(PathBuf::from(input.as_str()), err))?;
        if bytes_read == 0 {
            break;
        }
        let line_start = offset;
        offset += bytes_read as u64;

        let Some(tab) = line.find('\t') else {
            continue;
        };
        let Ok(id) = line[..tab].parse::<u32>() else {
            continue;
        };

        match current {
            Some((current_id, _)) if current_id == id => {}
            Some((current_id, run_start)) => {
                write_run(out.as_mut(), current_id, run_start, exclude.is_excluded(&project, current_id))
                    .map_err(|err| AppError::WriteOutput(PathBuf::from(output.as_str()), err))?;
                current = Some((id, line_start));
            }
            None => current = Some((id, line_start)),
        }
    }

    if let Some((id, run_start)) = current {
        write_run(out.as_mut(), id, run_start, exclude.is_excluded(&project, id))
            .map_err(|err| AppError::WriteOutput(PathBuf::from(output.as_str()), err))?;
    }

    Ok(())
}

fn write_run(out: &mut dyn Write, id: u32, offset: u64, excluded: bool) -> std::io::Result<()> {
    let sign = if excluded { "-" } else { "" };
    writeln!(out, "{id}\t{sign}{offset}")
}
