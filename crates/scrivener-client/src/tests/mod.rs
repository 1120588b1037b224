//! Crate-level behavioural tests for the invocation client.
