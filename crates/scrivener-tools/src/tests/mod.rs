//! Crate-level test modules.

mod behaviour;
