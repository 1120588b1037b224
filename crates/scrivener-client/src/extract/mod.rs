//! Response extraction from captured worker output.
//!
//! Workers may print diagnostics alongside the response line. [`extract`]
//! scans the output for balanced `{...}` spans and takes the first one that
//! parses as a JSON object carrying a `protocol_version` key as the response
//! candidate. The function is pure: the same output always yields the same
//! classification.

use scrivener_protocol::span::object_spans;
use scrivener_protocol::{ErrorInfo, RequestId, Response, ResponseBody};
use serde_json::Value;
use thiserror::Error;

/// Outcome carried by a well-formed response.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// The method succeeded; the value is returned untouched.
    Success(Value),
    /// The method failed; the worker's error object is returned intact.
    ToolError(ErrorInfo),
}

/// Output that could not be turned into a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProtocolViolation {
    message: String,
    raw: String,
}

impl ProtocolViolation {
    fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            raw: raw.to_owned(),
        }
    }

    /// Returns the description of the violation.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the raw output the violation was found in.
    #[must_use]
    pub const fn raw(&self) -> &str {
        self.raw.as_str()
    }

    /// Consumes the violation and returns its message and raw output.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.message, self.raw)
    }
}

/// Extracts and classifies the response for `expected` from worker output.
///
/// # Errors
///
/// Returns a [`ProtocolViolation`] when no response candidate exists, the
/// candidate is not a well-formed response, or its id does not match.
///
/// # Example
///
/// ```
/// use scrivener_client::extract::{Extracted, extract};
/// use scrivener_protocol::RequestId;
///
/// let output = "loading...\n{\"protocol_version\":\"2.0\",\"id\":\"7\",\"result\":\"ok\"}\n";
/// let outcome = extract(output, &RequestId::from("7")).expect("valid response");
/// assert_eq!(outcome, Extracted::Success(serde_json::json!("ok")));
/// ```
pub fn extract(output: &str, expected: &RequestId) -> Result<Extracted, ProtocolViolation> {
    let candidate = find_candidate(output).ok_or_else(|| {
        let message = if output.trim().is_empty() {
            "worker produced no output"
        } else {
            "worker output contains no response envelope"
        };
        ProtocolViolation::new(message, output)
    })?;

    let response: Response = serde_json::from_value(candidate).map_err(|error| {
        ProtocolViolation::new(format!("malformed response envelope: {error}"), output)
    })?;

    match response.id() {
        Some(id) if id == expected => {}
        Some(id) => {
            return Err(ProtocolViolation::new(
                format!("response id '{id}' does not match request id '{expected}'"),
                output,
            ));
        }
        None => {
            let detail = match response.into_body() {
                ResponseBody::Error(error) => format!(
                    "response carries a null id, expected '{expected}': worker reported {} ({})",
                    error.message(),
                    error.code()
                ),
                ResponseBody::Result(_) => {
                    format!("response carries a null id, expected '{expected}'")
                }
            };
            return Err(ProtocolViolation::new(detail, output));
        }
    }

    Ok(match response.into_body() {
        ResponseBody::Result(value) => Extracted::Success(value),
        ResponseBody::Error(error) => Extracted::ToolError(error),
    })
}

/// Returns the first balanced span that is an object with a
/// `protocol_version` key. A rejected span is searched for nested candidates
/// before scanning moves past it.
fn find_candidate(output: &str) -> Option<Value> {
    let mut spans = object_spans(output);
    while let Some(span) = spans.next() {
        if let Ok(value) = serde_json::from_str::<Value>(span)
            && value
                .as_object()
                .is_some_and(|object| object.contains_key("protocol_version"))
        {
            return Some(value);
        }
        spans.descend();
    }
    None
}
