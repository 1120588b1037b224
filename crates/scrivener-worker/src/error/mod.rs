//! Errors raised by handlers and by the worker run loop.
//!
//! Handler failures never leave the dispatcher: they are converted into
//! [`ErrorInfo`] objects on the response. Run loop errors describe failures
//! of the standard streams themselves and end the loop.

use scrivener_protocol::{ErrorCode, ErrorInfo};
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a method handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    /// The parameters did not match the shape the handler expects.
    #[error("invalid params: {message}")]
    InvalidParams {
        /// Description of the mismatch.
        message: String,
    },

    /// The handler ran but could not produce a result.
    #[error("{message}")]
    Failed {
        /// Human-readable failure description.
        message: String,
        /// Optional structured detail forwarded to the caller.
        data: Option<Value>,
    },
}

impl HandlerError {
    /// Creates an [`HandlerError::InvalidParams`] error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a [`HandlerError::Failed`] error without detail.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            data: None,
        }
    }

    /// Converts the failure into the error object carried on the wire.
    #[must_use]
    pub fn into_error_info(self) -> ErrorInfo {
        match self {
            Self::InvalidParams { message } => {
                ErrorInfo::new(ErrorCode::InvalidParams, format!("invalid params: {message}"))
            }
            Self::Failed { message, data } => {
                let info = ErrorInfo::new(ErrorCode::InternalError, message);
                match data {
                    Some(detail) => info.with_data(detail),
                    None => info,
                }
            }
        }
    }
}

/// Errors that end the worker run loop.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// Reading a request line from the input stream failed.
    #[error("failed to read request line: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a response line to the output stream failed.
    #[error("failed to write response line: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising a response failed.
    #[error("failed to serialise response: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests;
