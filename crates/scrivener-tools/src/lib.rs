//! Text tool worker for the Scrivener invocation protocol.
//!
//! The `scrivener-tools` binary reads one request per line from standard
//! input and writes one response per line to standard output. It serves
//! `echo`, `add`, `correct`, `polish` and `summarize`; the last three rely on
//! a text backend, either a chat endpoint (`backend_base_url`) or a local
//! program (`backend_program`).
//!
//! ```no_run
//! use std::io::{self, BufReader};
//!
//! use scrivener_config::Config;
//!
//! let config = Config::default();
//! let mut input = BufReader::new(io::stdin().lock());
//! let mut output = io::stdout().lock();
//! scrivener_tools::run(&config, &mut input, &mut output)?;
//! # Ok::<(), scrivener_tools::ToolsError>(())
//! ```

pub mod backend;
pub mod handlers;
#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};
use std::sync::Arc;

use ortho_config::OrthoError;
use scrivener_config::Config;
use scrivener_config::telemetry::TelemetryError;
use scrivener_worker::{RunLoopError, serve};
use thiserror::Error;
use tracing::info;

pub use self::backend::{
    BackendError, ChatBackend, ChatSettings, CommandBackend, TextBackend, UnconfiguredBackend,
};
pub use self::handlers::build_registry;

/// Tracing target for worker start-up.
const TOOLS_TARGET: &str = "scrivener_tools";

/// Errors that stop the worker binary.
#[derive(Debug, Error)]
pub enum ToolsError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    Configuration(Arc<OrthoError>),
    /// The configured text backend could not be set up.
    #[error("failed to set up text backend: {0}")]
    Backend(#[from] BackendError),
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The request loop stopped on a stream failure.
    #[error(transparent)]
    Serve(#[from] RunLoopError),
}

/// Serves requests from `input` until end of input.
///
/// # Errors
///
/// Returns [`ToolsError::Backend`] when the text backend cannot be set up
/// and [`ToolsError::Serve`] when reading or writing the streams fails.
pub fn run(
    config: &Config,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(), ToolsError> {
    let registry = build_registry(backend::from_config(config)?);
    info!(
        target: TOOLS_TARGET,
        methods = registry.len(),
        backend = backend::describe(config),
        "serving tool requests"
    );
    serve(&registry, input, output)?;
    Ok(())
}
