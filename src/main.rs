//! Assetline - command-line tool for building and serving front-end assets

use std::process::ExitCode;

use assetline::cli;

fn main() -> ExitCode {
    cli::run()
}
