//! Wire envelope shared by Scrivener callers and workers.
//!
//! A caller writes one [`Request`] per line to a worker's standard input and
//! the worker answers with one [`Response`] per line on standard output. Both
//! sides agree on [`PROTOCOL_VERSION`]; anything else is rejected.
//!
//! ```text
//! {"protocol_version":"2.0","id":1,"method":"echo","params":{"text":"hi"}}
//! {"protocol_version":"2.0","id":1,"result":"hi"}
//! ```
//!
//! The [`span`] module locates envelope candidates inside output that also
//! carries free-form diagnostics.
//!
//! # Example
//!
//! ```
//! use scrivener_protocol::{Params, Request, RequestId, Response};
//!
//! let request = Request::new(RequestId::from(7), "echo", Params::new());
//! let response = Response::success(Some(request.id().clone()), serde_json::json!("ok"));
//! assert_eq!(response.id(), Some(&RequestId::from(7)));
//! assert!(response.result().is_some());
//! ```

pub mod envelope;
pub mod span;

pub use self::envelope::{
    EnvelopeError, ErrorCode, ErrorInfo, PROTOCOL_VERSION, Params, Request, RequestId, Response,
    ResponseBody,
};
