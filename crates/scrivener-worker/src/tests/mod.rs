//! Crate-level behavioural tests for the worker.
