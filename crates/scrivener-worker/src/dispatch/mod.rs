//! Request dispatch.
//!
//! [`dispatch`] validates a decoded [`Request`], resolves its handler and
//! turns the outcome into exactly one [`Response`]. Handler failures, including
//! panics, become error responses; nothing escapes to the run loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use scrivener_protocol::{ErrorCode, PROTOCOL_VERSION, Params, Request, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::HandlerError;
use crate::registry::{Handler, MethodRegistry};

/// Tracing target for dispatch operations.
const DISPATCH_TARGET: &str = "scrivener_worker::dispatch";

/// Dispatches one request against the registry.
///
/// # Example
///
/// ```
/// use scrivener_protocol::{ErrorCode, Params, Request, RequestId};
/// use scrivener_worker::{MethodRegistry, dispatch};
///
/// let registry = MethodRegistry::new();
/// let request = Request::new(RequestId::from(1), "missing", Params::new());
/// let response = dispatch(&registry, &request);
/// assert_eq!(
///     response.error_info().and_then(|error| error.kind()),
///     Some(ErrorCode::MethodNotFound)
/// );
/// ```
#[must_use]
pub fn dispatch(registry: &MethodRegistry, request: &Request) -> Response {
    let id = Some(request.id().clone());

    if request.protocol_version() != PROTOCOL_VERSION {
        return Response::error(
            id,
            ErrorCode::InvalidRequest,
            format!(
                "unsupported protocol version '{}', expected '{PROTOCOL_VERSION}'",
                request.protocol_version()
            ),
        );
    }

    let method = request.method();
    if method.trim().is_empty() {
        return Response::error(
            id,
            ErrorCode::InvalidRequest,
            "request method must not be empty",
        );
    }

    let Some(handler) = registry.get(method) else {
        debug!(
            target: DISPATCH_TARGET,
            method,
            id = %request.id(),
            "method not found"
        );
        return Response::error(
            id,
            ErrorCode::MethodNotFound,
            format!("method '{method}' not found"),
        );
    };

    let started = Instant::now();
    let outcome = call_guarded(handler, request.params());
    debug!(
        target: DISPATCH_TARGET,
        method,
        id = %request.id(),
        success = outcome.is_ok(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "dispatched request"
    );

    match outcome {
        Ok(value) => Response::success(id, value),
        Err(error) => Response::failure(id, error.into_error_info()),
    }
}

/// Calls the handler, converting a panic into [`HandlerError::Failed`].
fn call_guarded(handler: &dyn Handler, params: &Params) -> Result<Value, HandlerError> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.call(params))).unwrap_or_else(|payload| {
        let detail = panic_message(payload.as_ref());
        warn!(target: DISPATCH_TARGET, detail, "handler panicked");
        Err(HandlerError::failed(format!("handler panicked: {detail}")))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
