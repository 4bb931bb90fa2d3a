//! # Relay Telemetry
//!
//! Logging and tracing support for the relay crates.
//!
//! This crate provides:
//! - Structured logging with JSON and pretty formats
//! - Rolling log files
//! - Secret masking for anything that might end up in a log line
//! - Span constructors for stream, REST and dispatch work

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Sensitive data masking
pub mod masking;

/// Span definitions for tracing
pub mod spans;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, LoggingError, init_logging};
    pub use crate::masking::{SensitiveDataMasker, mask_secret};
    pub use crate::spans::*;
}
