//! CLI surface (spec.md §6 "CLI"): `server [/path/to/config]`.

use std::path::PathBuf;

use clap::Parser;

/// kvdoorman: a single-process, in-memory key/value server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a config file. Omitted: built-in defaults.
    pub config_path: Option<PathBuf>,
}

/// `clap`'s own usage-error exit code is 2; spec.md §6 pins every CLI/config
/// fatal condition to exit code 1, so errors are reported and the process
/// exits explicitly rather than delegating to `Parser::parse`.
pub fn parse() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
