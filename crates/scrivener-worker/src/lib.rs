//! Worker side of the Scrivener tool protocol.
//!
//! A worker builds a [`MethodRegistry`] at startup, then hands it to [`serve`]
//! together with its standard input and output. Every request line is decoded,
//! routed by [`dispatch`] to the bound [`Handler`], and answered with exactly
//! one response line.
//!
//! ```no_run
//! use std::io::{self, BufReader};
//!
//! use scrivener_worker::{HandlerError, MethodRegistry, serve};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct EchoParams {
//!     text: String,
//! }
//!
//! let mut registry = MethodRegistry::new();
//! registry.register_fn("echo", "Returns the text unchanged", |p: EchoParams| {
//!     Ok::<_, HandlerError>(p.text)
//! });
//!
//! let mut input = BufReader::new(io::stdin().lock());
//! let mut output = io::stdout().lock();
//! serve(&registry, &mut input, &mut output).expect("serve");
//! ```

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod run_loop;

#[cfg(test)]
mod tests;

pub use self::dispatch::dispatch;
pub use self::error::{HandlerError, RunLoopError};
pub use self::registry::{Handler, MethodInfo, MethodRegistry};
pub use self::run_loop::{handle_line, serve};
