//! Text backends used by the correction, polishing and summary tools.
//!
//! A backend receives task instructions and the user's text and returns the
//! raw reply. The tools locate a JSON object inside that reply, so a backend
//! is free to surround it with commentary.
//!
//! Two backends are available. [`ChatBackend`] posts the instructions as a
//! system message and the text as a user message to an OpenAI-compatible
//! chat-completions endpoint. [`CommandBackend`] runs a local program per
//! call. [`from_config`] picks one from the loaded configuration.

mod chat;
mod command;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use scrivener_config::Config;
use thiserror::Error;

pub use self::chat::{ChatBackend, ChatSettings};
pub use self::command::CommandBackend;

/// Tracing target for backend operations.
const BACKEND_TARGET: &str = "scrivener_tools::backend";

/// Collaborator that turns instructions plus text into a reply.
pub trait TextBackend: Send + Sync {
    /// Sends `instructions` and `text` to the backend and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the backend is unavailable or fails.
    fn complete(&self, instructions: &str, text: &str) -> Result<String, BackendError>;
}

/// Errors raised by text backends.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Neither a chat endpoint nor a backend program has been configured.
    #[error("text backend is not configured; set backend_base_url or backend_program")]
    Unconfigured,
    /// The backend process could not be started.
    #[error("failed to spawn text backend '{}': {source}", program.display())]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Exchanging data with the backend process failed.
    #[error("text backend i/o failed: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The backend exited unsuccessfully.
    #[error("text backend failed: {message}")]
    Failed {
        /// Exit code, absent when the process was killed by a signal.
        status: Option<i32>,
        /// Trimmed standard error, or a placeholder when it was empty.
        message: String,
    },
    /// The chat endpoint could not be reached or the client could not be
    /// built.
    #[error("chat request to '{endpoint}' failed: {source}")]
    Request {
        /// Endpoint the request was sent to.
        endpoint: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The chat endpoint answered with a non-success status.
    #[error("chat endpoint returned HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        message: String,
    },
    /// The backend's reply could not be decoded.
    #[error("text backend returned invalid output: {message}")]
    InvalidOutput {
        /// Decoding error details.
        message: String,
    },
}

/// Backend used when nothing is configured; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredBackend;

impl TextBackend for UnconfiguredBackend {
    fn complete(&self, _instructions: &str, _text: &str) -> Result<String, BackendError> {
        Err(BackendError::Unconfigured)
    }
}

/// Selects the backend described by `config`.
///
/// A chat endpoint takes precedence over a backend program. With neither
/// set the text tools report [`BackendError::Unconfigured`] per call.
///
/// # Errors
///
/// Returns [`BackendError::Request`] when the HTTP client cannot be built.
pub fn from_config(config: &Config) -> Result<Arc<dyn TextBackend>, BackendError> {
    if let Some(settings) = ChatSettings::from_config(config) {
        return Ok(Arc::new(ChatBackend::new(settings)?));
    }
    Ok(config.backend_program().map_or_else(
        || -> Arc<dyn TextBackend> { Arc::new(UnconfiguredBackend) },
        |program| -> Arc<dyn TextBackend> {
            Arc::new(CommandBackend::new(program, config.backend_args.clone()))
        },
    ))
}

/// Names the configured backend kind for start-up logging.
#[must_use]
pub fn describe(config: &Config) -> &'static str {
    if config.backend_base_url.is_some() {
        "chat"
    } else if config.backend_program().is_some() {
        "command"
    } else {
        "none"
    }
}
