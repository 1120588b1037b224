//! Caller-visible invocation errors.
//!
//! Every failed invocation is reported as exactly one [`InvokeError`] variant.
//! I/O errors are wrapped in `Arc` to satisfy the `result_large_err` Clippy
//! lint and keep the error cheap to clone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use scrivener_protocol::ErrorInfo;
use thiserror::Error;

/// Errors arising from a single worker invocation.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The call was rejected before any process was spawned.
    #[error("invalid invocation argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The worker did not finish before the deadline and was killed.
    #[error("method '{method}' timed out after {}ms", .deadline.as_millis())]
    Timeout {
        /// Method being invoked.
        method: String,
        /// Deadline that elapsed.
        deadline: Duration,
    },

    /// The worker could not be spawned, its pipes failed, or it exited with a
    /// non-zero status.
    #[error("transport failure invoking '{method}': {message}")]
    Transport {
        /// Method being invoked.
        method: String,
        /// Human-readable failure description.
        message: String,
        /// Exit code, when the worker ran to completion.
        status: Option<i32>,
        /// Standard error captured from the worker.
        stderr: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The worker exited cleanly but its output carried no usable response.
    #[error("protocol violation invoking '{method}': {message}")]
    Protocol {
        /// Method being invoked.
        method: String,
        /// Description of the violation.
        message: String,
        /// Raw standard output captured from the worker.
        raw: String,
    },

    /// The worker answered with an error object.
    #[error("method '{method}' failed: {error}")]
    Tool {
        /// Method being invoked.
        method: String,
        /// Error object returned by the worker.
        error: ErrorInfo,
    },
}

impl InvokeError {
    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidArgument { .. } => FailureKind::InvalidArgument,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Protocol { .. } => FailureKind::Protocol,
            Self::Tool { .. } => FailureKind::Tool,
        }
    }

    /// Returns whether a fresh attempt might succeed.
    ///
    /// Timeouts and transport failures are environmental; the other classes
    /// will repeat for the same input.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    pub(crate) fn transport(
        method: &str,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Transport {
            method: method.to_owned(),
            message: message.into(),
            status: None,
            stderr: String::new(),
            source: source.map(Arc::new),
        }
    }
}

/// Failure classes reported by [`InvokeError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`InvokeError::InvalidArgument`].
    InvalidArgument,
    /// See [`InvokeError::Timeout`].
    Timeout,
    /// See [`InvokeError::Transport`].
    Transport,
    /// See [`InvokeError::Protocol`].
    Protocol,
    /// See [`InvokeError::Tool`].
    Tool,
}

impl FailureKind {
    /// Returns the snake-case label used in machine-readable output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Timeout => "timeout",
            Self::Transport => "transport_error",
            Self::Protocol => "protocol_error",
            Self::Tool => "tool_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
