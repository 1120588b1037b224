//! Shared configuration for the Scrivener binaries.
//!
//! [`Config`] is loaded through `ortho_config`, layering built-in defaults,
//! an optional configuration file, `SCRIVENER_*` environment variables and
//! command-line flags, in increasing order of precedence. The [`telemetry`]
//! module installs the process-wide tracing subscriber from the loaded
//! configuration.

mod defaults;
pub mod telemetry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_BACKEND_MODEL, DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_DEADLINE_MS, DEFAULT_LOG_FILTER,
    DEFAULT_SEARCH_PATH_VAR, DEFAULT_WORKER_PROGRAM, default_backend_model,
    default_backend_timeout_ms, default_deadline_ms, default_log_filter,
    default_log_filter_string, default_log_format, default_search_path_var,
    default_worker_program,
};
pub use self::telemetry::{LogFormat, LogFormatParseError};

/// Configuration shared by the worker and the command-line caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SCRIVENER")]
pub struct Config {
    /// Tracing filter directive, e.g. `info` or `scrivener_client=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Worker executable spawned by the caller.
    #[serde(default = "default_worker_program")]
    #[ortho_config(default = default_worker_program())]
    pub worker_program: PathBuf,
    /// Extra arguments passed to the worker.
    #[serde(default)]
    pub worker_args: Vec<String>,
    /// Working directory for worker processes.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    /// Directories appended to the worker's search path.
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
    /// Environment variable the search path entries are appended to.
    #[serde(default = "default_search_path_var")]
    #[ortho_config(default = default_search_path_var())]
    pub search_path_var: String,
    /// Per-call deadline in milliseconds.
    #[serde(default = "default_deadline_ms")]
    #[ortho_config(default = default_deadline_ms())]
    pub deadline_ms: u64,
    /// External command used by the text tools; unset disables them.
    #[serde(default)]
    pub backend_program: Option<PathBuf>,
    /// Extra arguments passed to the text backend before the instructions.
    #[serde(default)]
    pub backend_args: Vec<String>,
    /// Base URL of an OpenAI-compatible chat endpoint, e.g.
    /// `https://dashscope.aliyuncs.com/compatible-mode/v1`. Takes precedence
    /// over `backend_program`.
    #[serde(default)]
    pub backend_base_url: Option<String>,
    /// Bearer token sent to the chat endpoint.
    #[serde(default)]
    pub backend_api_key: Option<String>,
    /// Model requested from the chat endpoint.
    #[serde(default = "default_backend_model")]
    #[ortho_config(default = default_backend_model())]
    pub backend_model: String,
    /// Time allowed for one chat request, in milliseconds.
    #[serde(default = "default_backend_timeout_ms")]
    #[ortho_config(default = default_backend_timeout_ms())]
    pub backend_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            worker_program: default_worker_program(),
            worker_args: Vec::new(),
            working_directory: None,
            search_path: Vec::new(),
            search_path_var: default_search_path_var(),
            deadline_ms: default_deadline_ms(),
            backend_program: None,
            backend_args: Vec::new(),
            backend_base_url: None,
            backend_api_key: None,
            backend_model: default_backend_model(),
            backend_timeout_ms: default_backend_timeout_ms(),
        }
    }
}

impl Config {
    /// Returns the tracing filter directive.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the worker executable.
    #[must_use]
    pub fn worker_program(&self) -> &Path {
        &self.worker_program
    }

    /// Returns the configured working directory, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Returns the per-call deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Returns the chat backend request timeout.
    #[must_use]
    pub const fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Returns the text backend executable, if configured.
    #[must_use]
    pub fn backend_program(&self) -> Option<&Path> {
        self.backend_program.as_deref()
    }
}
