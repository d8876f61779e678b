//! # Datadis Utils
//!
//! Infrastructure helpers shared by the Datadis crates: retry/backoff
//! policy and log-safe formatting.

pub mod formatters;
pub mod retry;

// Re-export common types for convenience
pub use formatters::*;
pub use retry::*;
