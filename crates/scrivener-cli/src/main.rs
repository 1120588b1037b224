//! CLI entrypoint for invoking Scrivener worker methods.
//!
//! The binary delegates to [`scrivener_cli::run`], which loads configuration,
//! parses the method and its parameters, runs one worker process and prints
//! the outcome as a JSON line.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    scrivener_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
