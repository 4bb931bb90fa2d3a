//! # Relay Core
//!
//! Shared vocabulary of the relay exchange connectivity layer.
//!
//! This crate provides:
//! - Structured keys (`ExchangeId`, `Symbol`, `Interval`, `Topic`)
//! - Canonical market and account records (`Trade`, `Candle`, `OrderBook`, `Account`, `Order`)
//! - Consumer and status events
//! - The error hierarchy
//! - Capability traits for exchanges, stream sinks/observers and normalizers
//! - Configuration parsing with environment variable overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

/// Structured keys
pub mod types;

/// Canonical market and account records
pub mod data;

/// Consumer and status events
pub mod events;

/// Error types and handling
pub mod error;

/// Capability traits
pub mod traits;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::*;
    pub use crate::error::{RelayError, Result};
    pub use crate::events::{MarketEvent, StatusEvent};
    pub use crate::traits::*;
    pub use crate::types::*;
}
