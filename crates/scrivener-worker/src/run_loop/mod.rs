//! Line-oriented worker run loop.
//!
//! [`serve`] reads requests one line at a time, dispatches each against the
//! registry and writes exactly one response line per non-blank input line,
//! flushing after every response. The loop ends cleanly at end of input.

use std::io::{BufRead, Write};

use scrivener_protocol::{ErrorCode, Request, RequestId, Response};
use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::dispatch;
use crate::error::RunLoopError;
use crate::registry::MethodRegistry;

/// Tracing target for run loop operations.
const RUN_LOOP_TARGET: &str = "scrivener_worker::run_loop";

/// Serves requests from `input` until end of input.
///
/// # Errors
///
/// Returns a [`RunLoopError`] if reading from `input`, serialising a response,
/// or writing to `output` fails.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
///
/// use scrivener_worker::{MethodRegistry, serve};
///
/// let registry = MethodRegistry::new();
/// let mut input = Cursor::new(b"not json\n".to_vec());
/// let mut output = Vec::new();
/// serve(&registry, &mut input, &mut output).expect("serve");
/// let line = String::from_utf8(output).expect("utf-8");
/// assert!(line.contains("-32700"));
/// ```
pub fn serve(
    registry: &MethodRegistry,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(), RunLoopError> {
    let mut buffer = Vec::new();
    let mut answered = 0_u64;

    loop {
        buffer.clear();
        let bytes_read = input
            .read_until(b'\n', &mut buffer)
            .map_err(|source| RunLoopError::Read { source })?;
        if bytes_read == 0 {
            break;
        }

        let line = buffer.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(registry, line);
        write_response(output, &response)?;
        answered += 1;
    }

    info!(
        target: RUN_LOOP_TARGET,
        answered,
        "input closed, worker run loop finished"
    );
    Ok(())
}

/// Turns one raw request line into its response.
#[must_use]
pub fn handle_line(registry: &MethodRegistry, line: &[u8]) -> Response {
    let Ok(text) = std::str::from_utf8(line) else {
        return Response::error(None, ErrorCode::ParseError, "request line is not valid UTF-8");
    };

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(error) => {
            debug!(target: RUN_LOOP_TARGET, %error, "rejected unparseable request line");
            return Response::error(
                None,
                ErrorCode::ParseError,
                format!("request line is not valid JSON: {error}"),
            );
        }
    };

    let id = readable_id(&value);
    match serde_json::from_value::<Request>(value) {
        Ok(request) => dispatch(registry, &request),
        Err(error) => Response::error(
            id,
            ErrorCode::InvalidRequest,
            format!("request is not a valid envelope: {error}"),
        ),
    }
}

/// Recovers the correlation id from a payload that failed envelope decoding.
fn readable_id(value: &Value) -> Option<RequestId> {
    value
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

fn write_response(output: &mut impl Write, response: &Response) -> Result<(), RunLoopError> {
    let payload =
        serde_json::to_string(response).map_err(|source| RunLoopError::Serialize { source })?;
    output
        .write_all(payload.as_bytes())
        .map_err(|source| RunLoopError::Write { source })?;
    output
        .write_all(b"\n")
        .map_err(|source| RunLoopError::Write { source })?;
    output
        .flush()
        .map_err(|source| RunLoopError::Write { source })
}
