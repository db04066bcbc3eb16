//! Uniform handling of stdin/stdout vs. a named file: inputs and outputs are
//! modeled as owned handles behind one capability type, constructed through
//! a factory, rather than a raw pointer keyed by whether the path equals `-`.

use crate::error::AppError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A path argument: either the `-` stdio placeholder or a real file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    Stdio,
    Path(PathBuf),
}

impl Spec {
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            Self::Stdio
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }

    /// The raw string this spec was parsed from, for project-name derivation
    /// and diagnostics.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stdio => "-",
            Self::Path(path) => path.to_str().unwrap_or("-"),
        }
    }
}

/// Opens an input spec for buffered reading.
pub fn open_input(spec: &Spec) -> Result<Box<dyn BufRead>, AppError> {
    match spec {
        Spec::Stdio => Ok(Box::new(BufReader::new(io::stdin()))),
        Spec::Path(path) => open_input_file(path),
    }
}

fn open_input_file(path: &Path) -> Result<Box<dyn BufRead>, AppError> {
    File::open(path)
        .map(|file| Box::new(BufReader::new(file)) as Box<dyn BufRead>)
        .map_err(|err| AppError::OpenInput(path.to_path_buf(), err))
}

/// Creates an output spec for buffered writing, truncating any existing
/// file.
pub fn create_output(spec: &Spec) -> Result<Box<dyn Write>, AppError> {
    match spec {
        Spec::Stdio => Ok(Box::new(io::stdout())),
        Spec::Path(path) => create_output_file(path),
    }
}

fn create_output_file(path: &Path) -> Result<Box<dyn Write>, AppError> {
    File::create(path)
        .map(|file| Box::new(BufWriter::new(file)) as Box<dyn Write>)
        .map_err(|err| AppError::OpenOutput(path.to_path_buf(), err))
}
