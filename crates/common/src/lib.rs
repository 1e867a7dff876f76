//! Shared runtime helpers for the message board crates.
//!
//! - `utils::logging`: tracing subscriber initialisation
//! - `env`: startup checks for the data directory

pub mod env;
pub mod utils;
