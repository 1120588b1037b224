//! Well-known error codes.

/// Error codes understood by both sides of the protocol.
///
/// The integer values follow JSON-RPC 2.0 so that existing tooling can read
/// worker output. Workers may emit other codes; those pass through unchanged
/// in [`ErrorInfo`](super::ErrorInfo) and map to `None` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request line was not valid JSON.
    ParseError,
    /// The JSON was not a valid request envelope.
    InvalidRequest,
    /// No handler is registered under the requested name.
    MethodNotFound,
    /// The parameters did not match the handler's declared shape.
    InvalidParams,
    /// The handler failed while executing.
    InternalError,
}

impl ErrorCode {
    /// Returns the integer carried on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32_700,
            Self::InvalidRequest => -32_600,
            Self::MethodNotFound => -32_601,
            Self::InvalidParams => -32_602,
            Self::InternalError => -32_603,
        }
    }

    /// Maps a wire integer back to a well-known code.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -32_700 => Some(Self::ParseError),
            -32_600 => Some(Self::InvalidRequest),
            -32_601 => Some(Self::MethodNotFound),
            -32_602 => Some(Self::InvalidParams),
            -32_603 => Some(Self::InternalError),
            _ => None,
        }
    }
}
