//! `wiki-census`: extracts and validates MediaWiki template invocations from
//! XML dump files.
//!
//! The sub-modes (default extract, `-offsets`, `-values`, `-t`) are parsed in
//! [`args`] and dispatched here; each mode lives in its own `modes::` module.

mod args;
mod driver;
mod error;
mod io;
mod modes;
mod policy;
mod preg;
mod processor;
mod registry;
mod selftest;
mod strutil;
mod wikitext;

use error::AppError;

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mode = match args::parse() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("{err}");
            args::usage();
            std::process::exit(1);
        }
    };

    if let Err(err) = run(mode) {
        eprintln!("wiki-census: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(mode: args::Mode) -> Result<(), AppError> {
    match mode {
        args::Mode::SelfTest => match selftest::run() {
            Ok(()) => {
                log::info!("self-test: all scenarios passed");
                Ok(())
            }
            Err(message) => {
                eprintln!("self-test failed: {message}");
                std::process::exit(1);
            }
        },
        args::Mode::Extract {
            verbose,
            input,
            output,
            totals,
        } => modes::extract::run(verbose, input, output, totals),
        args::Mode::Offsets { input, output } => modes::offsets::run(input, output),
        args::Mode::Values {
            verbose,
            input,
            output_prefix,
            names,
        } => modes::values::run(verbose, input, output_prefix, names),
    }
}
