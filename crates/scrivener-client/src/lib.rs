//! Caller side of the Scrivener tool protocol.
//!
//! [`InvocationClient::invoke`] spawns one worker process per call, writes a
//! single request line to it, and waits for exit under a deadline. The
//! captured output is classified by [`extract`](extract::extract) into a
//! result value or one of the [`InvokeError`] variants.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scrivener_client::{InvocationClient, WorkerCommand};
//! use scrivener_protocol::Params;
//!
//! let client = InvocationClient::new(WorkerCommand::new("scrivener-tools"));
//! let mut params = Params::new();
//! params.insert("text".into(), "hello".into());
//! match client.invoke("echo", params, Duration::from_secs(15), None) {
//!     Ok(value) => assert_eq!(value, "hello"),
//!     Err(error) if error.is_retriable() => eprintln!("retry later: {error}"),
//!     Err(error) => eprintln!("{}: {error}", error.kind()),
//! }
//! ```

pub mod error;
pub mod extract;
pub mod invocation;
pub mod process;

#[cfg(test)]
mod tests;

pub use self::error::{FailureKind, InvokeError};
pub use self::invocation::{
    CapturedOutput, DEFAULT_SEARCH_PATH_VAR, InvocationAttempt, InvocationClient, WorkerCommand,
    WorkerLauncher,
};
pub use self::process::ProcessLauncher;
