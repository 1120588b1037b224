//! Command-line caller for Scrivener workers.
//!
//! `scrivener [CONFIG FLAGS] METHOD [--param key=value]...` loads the shared
//! configuration, spawns one worker process for the call and prints a single
//! JSON line describing the outcome:
//!
//! ```text
//! {"status":"success","result":"hello"}
//! {"status":"error","kind":"timeout","message":"...","retriable":true}
//! ```
//!
//! The exit code is zero only for a successful call.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;
use scrivener_client::{InvocationClient, InvokeError, WorkerCommand};
use scrivener_config::Config;
use scrivener_config::telemetry::{self, TelemetryError};
use serde_json::{Map, Value, json};
use thiserror::Error;

mod cli;
mod config;
mod params;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use params::build_params;

/// Errors that prevent a call from being attempted.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to parse command-line arguments: {0}")]
    CliUsage(#[from] clap::Error),
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);

    let prepared = Cli::try_parse_from(&split.cli_arguments)
        .map_err(AppError::from)
        .and_then(|cli| {
            let config = loader.load(&split.config_arguments)?;
            telemetry::initialise(&config)?;
            Ok((cli, config))
        });

    let (cli, config) = match prepared {
        Ok(parts) => parts,
        Err(AppError::CliUsage(error))
            if matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = invoke(&cli, &config);
    let line = render_outcome(&outcome);
    if let Err(error) = writeln!(stdout, "{line}") {
        let _ = writeln!(stderr, "failed to write result: {error}");
        return ExitCode::FAILURE;
    }
    if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn invoke(cli: &Cli, config: &Config) -> Result<Value, InvokeError> {
    let params = build_params(&cli.params, cli.json_params.as_deref())?;
    let command = worker_command(cli, config);
    let deadline = cli
        .deadline_ms
        .map_or_else(|| config.deadline(), std::time::Duration::from_millis);
    InvocationClient::new(command).invoke(
        &cli.method,
        params,
        deadline,
        cli.working_directory.as_deref(),
    )
}

/// Builds the worker command from configuration, applying CLI overrides.
fn worker_command(cli: &Cli, config: &Config) -> WorkerCommand {
    let program = cli
        .worker
        .clone()
        .unwrap_or_else(|| config.worker_program().to_path_buf());
    let arguments = if cli.worker_args.is_empty() {
        &config.worker_args
    } else {
        &cli.worker_args
    };

    let mut command = WorkerCommand::new(program)
        .args(arguments.iter().cloned())
        .search_path_var(config.search_path_var.clone());
    for entry in &config.search_path {
        command = command.search_path_entry(entry.clone());
    }
    if let Some(directory) = config.working_directory() {
        command = command.working_directory(directory);
    }
    command
}

/// Renders the outcome as the single JSON object printed on stdout.
fn render_outcome(outcome: &Result<Value, InvokeError>) -> Value {
    match outcome {
        Ok(result) => json!({ "status": "success", "result": result }),
        Err(error) => {
            let mut body = Map::new();
            body.insert(String::from("status"), json!("error"));
            body.insert(String::from("kind"), json!(error.kind().as_str()));
            body.insert(String::from("message"), json!(error.to_string()));
            body.insert(String::from("retriable"), json!(error.is_retriable()));
            if let InvokeError::Tool { error: info, .. } = error {
                body.insert(String::from("code"), json!(info.code()));
                if let Some(data) = info.data() {
                    body.insert(String::from("data"), data.clone());
                }
            }
            Value::Object(body)
        }
    }
}

#[cfg(test)]
mod tests;
