//! Binary entrypoint for the Scrivener text tool worker.

use std::io::{self, BufReader, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use scrivener_config::{Config, telemetry};
use scrivener_tools::{ToolsError, run};

fn main() -> ExitCode {
    match serve_stdio() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "{error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn serve_stdio() -> Result<(), ToolsError> {
    let config = Config::load().map_err(ToolsError::Configuration)?;
    telemetry::initialise(&config)?;

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    run(&config, &mut reader, &mut writer)
}
