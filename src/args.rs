//! Command-line argument parsing, `pico-args`-based in the style of
//! `wiki-rs`'s `Args::new`: free positional arguments plus flags, a
//! hand-written `usage()`, and a `thiserror` error for malformed invocations.

use crate::io::Spec;
use std::ffi::OsStr;

/// Errors that may occur when parsing arguments.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing input path")]
    MissingInput,

    #[error("missing output path")]
    MissingOutput,

    #[error("missing totals path")]
    MissingTotals,

    #[error("missing template name list")]
    MissingTemplateNames,

    #[error("unknown arguments: {}", _0.display())]
    Extra(std::ffi::OsString),

    #[error(transparent)]
    Pico(#[from] pico_args::Error),
}

/// The selected run mode and its arguments.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Run the embedded self-test suite and exit.
    SelfTest,
    /// Default mode: extract invocations and write totals.
    Extract {
        verbose: bool,
        input: Spec,
        output: Spec,
        totals: Spec,
    },
    /// `-offsets`: compute per-template byte offsets over a sorted records
    /// stream.
    Offsets { input: Spec, output: Spec },
    /// `-values`: per-page value dump for a chosen set of template names.
    Values {
        verbose: bool,
        input: Spec,
        output_prefix: Spec,
        names: Vec<String>,
    },
}

fn free_path(args: &mut pico_args::Arguments, missing: Error) -> Result<Spec, Error> {
    args.free_from_str::<String>()
        .map(|raw| Spec::parse(&raw))
        .map_err(|_| missing)
}

fn finish(args: pico_args::Arguments) -> Result<(), Error> {
    let rest = args.finish();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::Extra(rest.join(OsStr::new(" "))))
    }
}

/// Parses `std::env::args_os()` into a [`Mode`].
pub fn parse() -> Result<Mode, Error> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains("-t") {
        return Ok(Mode::SelfTest);
    }

    if args.contains("-offsets") {
        let input = free_path(&mut args, Error::MissingInput)?;
        let output = free_path(&mut args, Error::MissingOutput)?;
        finish(args)?;
        return Ok(Mode::Offsets { input, output });
    }

    if args.contains("-values") {
        let verbose = args.contains("-v");
        let input = free_path(&mut args, Error::MissingInput)?;
        let output_prefix = free_path(&mut args, Error::MissingOutput)?;
        let names_raw = args
            .free_from_str::<String>()
            .map_err(|_| Error::MissingTemplateNames)?;
        let names = names_raw.split(';').map(str::to_string).collect();
        finish(args)?;
        return Ok(Mode::Values {
            verbose,
            input,
            output_prefix,
            names,
        });
    }

    let verbose = args.contains("-v");
    let input = free_path(&mut args, Error::MissingInput)?;
    let output = free_path(&mut args, Error::MissingOutput)?;
    let totals = free_path(&mut args, Error::MissingTotals)?;
    finish(args)?;
    Ok(Mode::Extract {
        verbose,
        input,
        output,
        totals,
    })
}

/// Command-line usage instructions.
pub fn usage() {
    let exe = std::env::args().next().unwrap_or_default();
    eprintln!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    eprintln!("Usage:");
    eprintln!("  {exe} [-v] [-t] <in|-> <out|-> <totals|->");
    eprintln!("  {exe} -offsets <sorted-in|-> <out|->");
    eprintln!("  {exe} -values [-v] <in|-> <out-prefix|-> \"<tmplname>[;<alias>]*\"");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t          run the embedded self-test suite and exit");
    eprintln!("  -v          emit a progress marker every 100,000 pages");
    eprintln!("  -offsets    compute per-template byte offsets over a sorted records stream");
    eprintln!("  -values     dump per-page parameter values for the named templates");
}
