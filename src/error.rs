//! The top-level error type and the exit-code taxonomy it carries (spec §6/§7):
//! `0` success, `1` usage, `2`-`7` reserved for parser-allocation,
//! open-input-failed, open-output-failed, read-buffer-allocation-failed,
//! read-failed, and parse-failed respectively.

use std::path::PathBuf;

/// Every error this binary can terminate with, each mapped to one exit code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Args(#[from] crate::args::Error),

    #[error("failed to allocate the XML parser: {0}")]
    ParserInit(String),

    #[error("could not open input '{0}': {1}")]
    OpenInput(PathBuf, std::io::Error),

    #[error("could not open output '{0}': {1}")]
    OpenOutput(PathBuf, std::io::Error),

    #[error("write error on '{0}': {1}")]
    WriteOutput(PathBuf, std::io::Error),

    #[error("could not allocate a read buffer: {0}")]
    ReadBufferAlloc(String),

    #[error("read error on '{0}': {1}")]
    Read(PathBuf, std::io::Error),

    #[error(transparent)]
    Xml(#[from] crate::driver::Error),

    #[error(transparent)]
    Registry(#[from] crate::registry::Error),

    #[error(transparent)]
    Policy(#[from] crate::policy::Error),
}

impl AppError {
    /// The process exit code for this error, per the taxonomy above.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Args(_) => 1,
            Self::ParserInit(_) => 2,
            Self::OpenInput(..) | Self::Registry(_) | Self::Policy(_) => 3,
            Self::OpenOutput(..) | Self::WriteOutput(..) => 4,
            Self::ReadBufferAlloc(_) => 5,
            Self::Read(..) => 6,
            Self::Xml(_) => 7,
        }
    }
}
