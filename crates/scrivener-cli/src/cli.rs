//! CLI argument definitions for the `scrivener` caller.

use std::path::PathBuf;

use clap::Parser;

/// Invokes one method on a Scrivener worker and prints the outcome as JSON.
#[derive(Parser, Debug)]
#[command(name = "scrivener", version)]
pub(crate) struct Cli {
    /// Method to invoke (for example `echo`).
    #[arg(value_name = "METHOD")]
    pub(crate) method: String,
    /// Parameter as `key=value`; integers, floats and booleans are typed.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub(crate) params: Vec<String>,
    /// Parameters as a JSON object, replacing every `--param`.
    #[arg(long = "json-params", value_name = "JSON")]
    pub(crate) json_params: Option<String>,
    /// Deadline in milliseconds, overriding the configured value.
    #[arg(long = "deadline-ms", value_name = "MILLIS")]
    pub(crate) deadline_ms: Option<u64>,
    /// Worker executable, overriding the configured program.
    #[arg(long = "worker", value_name = "PATH")]
    pub(crate) worker: Option<PathBuf>,
    /// Argument passed to the worker; replaces the configured arguments.
    #[arg(long = "worker-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub(crate) worker_args: Vec<String>,
    /// Working directory for this call.
    #[arg(long = "cwd", value_name = "DIR")]
    pub(crate) working_directory: Option<PathBuf>,
}
