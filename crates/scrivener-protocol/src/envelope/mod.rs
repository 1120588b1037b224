//! Request and response envelope types.
//!
//! Requests and responses travel as single JSONL lines. A [`Response`] carries
//! exactly one of a `result` value or an `error` object; the invariant is
//! enforced when a response is decoded, so a value of this type is always
//! well formed.

mod code;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use self::code::ErrorCode;

/// Protocol version carried by every envelope.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Named parameters passed to a worker method.
pub type Params = serde_json::Map<String, Value>;

/// Correlation token linking a response to its request.
///
/// The token is echoed verbatim by the worker and never interpreted.
///
/// # Example
///
/// ```
/// use scrivener_protocol::RequestId;
///
/// let numeric: RequestId = serde_json::from_str("42").expect("number id");
/// let text: RequestId = serde_json::from_str("\"req-7\"").expect("string id");
/// assert_eq!(numeric, RequestId::from(42));
/// assert_eq!(text.to_string(), "req-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric token, preserved exactly as received.
    Number(serde_json::Number),
    /// String token.
    Text(String),
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Request written by a caller to a worker's stdin.
///
/// `protocol_version` and `method` default to empty strings when absent so
/// that the dispatcher, rather than the decoder, reports the violation and can
/// still echo the request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    protocol_version: String,
    id: RequestId,
    #[serde(default)]
    method: String,
    #[serde(default)]
    params: Params,
}

impl Request {
    /// Creates a request for the current protocol version.
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Params) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Returns the protocol version declared by the caller.
    #[must_use]
    pub const fn protocol_version(&self) -> &str {
        self.protocol_version.as_str()
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the named parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }
}

/// Structured error carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    code: i64,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ErrorInfo {
    /// Creates an error from a well-known code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_code(code.code(), message)
    }

    /// Creates an error with an arbitrary worker-defined code.
    #[must_use]
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches auxiliary data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the raw integer code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Returns the well-known code, if the integer maps to one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }

    /// Returns the human-readable message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the auxiliary data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Outcome carried by a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The method completed and produced a value (which may be `null`).
    Result(Value),
    /// The method or the envelope failed.
    Error(ErrorInfo),
}

/// Response written by a worker to its stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireResponse", into = "WireResponse")]
pub struct Response {
    protocol_version: String,
    id: Option<RequestId>,
    body: ResponseBody,
}

impl Response {
    /// Creates a successful response.
    #[must_use]
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self::with_body(id, ResponseBody::Result(result))
    }

    /// Creates a failed response from an error object.
    #[must_use]
    pub fn failure(id: Option<RequestId>, error: ErrorInfo) -> Self {
        Self::with_body(id, ResponseBody::Error(error))
    }

    /// Creates a failed response from a well-known code and message.
    #[must_use]
    pub fn error(id: Option<RequestId>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::failure(id, ErrorInfo::new(code, message))
    }

    fn with_body(id: Option<RequestId>, body: ResponseBody) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            id,
            body,
        }
    }

    /// Returns the protocol version.
    #[must_use]
    pub const fn protocol_version(&self) -> &str {
        self.protocol_version.as_str()
    }

    /// Returns the echoed correlation id; `None` when the request was unreadable.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Returns the response body.
    #[must_use]
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Consumes the response and returns its body.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Returns the result value for successful responses.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Result(value) => Some(value),
            ResponseBody::Error(_) => None,
        }
    }

    /// Returns the error object for failed responses.
    #[must_use]
    pub const fn error_info(&self) -> Option<&ErrorInfo> {
        match &self.body {
            ResponseBody::Result(_) => None,
            ResponseBody::Error(error) => Some(error),
        }
    }

    /// Returns whether the response carries a result.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Result(_))
    }
}

/// Violations detected while decoding a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The response declared a different protocol version.
    #[error(
        "unsupported protocol version '{found}', expected '{expected}'",
        expected = PROTOCOL_VERSION
    )]
    UnsupportedVersion {
        /// Version found in the payload.
        found: String,
    },
    /// Both `result` and `error` were present.
    #[error("response carries both 'result' and 'error'")]
    AmbiguousBody,
    /// Neither `result` nor `error` was present.
    #[error("response carries neither 'result' nor 'error'")]
    MissingBody,
}

#[derive(Serialize, Deserialize)]
struct WireResponse {
    protocol_version: String,
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

/// Keeps an explicit `null` result distinct from an absent one.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<WireResponse> for Response {
    type Error = EnvelopeError;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        if wire.protocol_version != PROTOCOL_VERSION {
            return Err(EnvelopeError::UnsupportedVersion {
                found: wire.protocol_version,
            });
        }
        let body = match (wire.result, wire.error) {
            (Some(result), None) => ResponseBody::Result(result),
            (None, Some(error)) => ResponseBody::Error(error),
            (Some(_), Some(_)) => return Err(EnvelopeError::AmbiguousBody),
            (None, None) => return Err(EnvelopeError::MissingBody),
        };
        Ok(Self {
            protocol_version: wire.protocol_version,
            id: wire.id,
            body,
        })
    }
}

impl From<Response> for WireResponse {
    fn from(response: Response) -> Self {
        let (result, error) = match response.body {
            ResponseBody::Result(value) => (Some(value), None),
            ResponseBody::Error(info) => (None, Some(info)),
        };
        Self {
            protocol_version: response.protocol_version,
            id: response.id,
            result,
            error,
        }
    }
}
