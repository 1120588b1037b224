//! Built-in configuration defaults.

use std::path::PathBuf;

use crate::telemetry::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default worker executable, resolved through the search path.
pub const DEFAULT_WORKER_PROGRAM: &str = "scrivener-tools";

/// Default variable extended with search-path entries.
pub const DEFAULT_SEARCH_PATH_VAR: &str = "PATH";

/// Default per-call deadline in milliseconds.
pub const DEFAULT_DEADLINE_MS: u64 = 15_000;

/// Default model requested from a chat backend.
pub const DEFAULT_BACKEND_MODEL: &str = "qwen-max";

/// Default time allowed for one chat backend request, in milliseconds.
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 60_000;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    String::from(DEFAULT_LOG_FILTER)
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default worker executable.
#[must_use]
pub fn default_worker_program() -> PathBuf {
    PathBuf::from(DEFAULT_WORKER_PROGRAM)
}

/// Owned search-path variable name used by serde.
#[must_use]
pub fn default_search_path_var() -> String {
    String::from(DEFAULT_SEARCH_PATH_VAR)
}

/// Default per-call deadline in milliseconds.
#[must_use]
pub const fn default_deadline_ms() -> u64 {
    DEFAULT_DEADLINE_MS
}

/// Owned chat model name used by serde.
#[must_use]
pub fn default_backend_model() -> String {
    String::from(DEFAULT_BACKEND_MODEL)
}

/// Default chat backend request timeout in milliseconds.
#[must_use]
pub const fn default_backend_timeout_ms() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_MS
}
