//! Logging and observability
//!
//! Structured logging via the `tracing` crate: console output plus an
//! optional JSON-formatted rolling file.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
