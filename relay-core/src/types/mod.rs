//! Structured keys shared by every relay component.
//!
//! # Types
//!
//! - [`ExchangeId`] - Lowercase exchange identifier
//! - [`Symbol`] - Instrument identifier as the exchange spells it
//! - [`Channel`] - Kind of market data stream
//! - [`Interval`] - Candle interval
//! - [`Topic`] - Composite subscription key
//! - [`ConnectionState`] - Stream connection lifecycle state

mod channel;
mod connection;
mod exchange_id;
mod symbol;
mod topic;

pub use channel::{Channel, Interval};
pub use connection::ConnectionState;
pub use exchange_id::ExchangeId;
pub use symbol::Symbol;
pub use topic::Topic;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Symbol format is invalid
    #[error("invalid symbol format: {0}")]
    InvalidSymbol(String),

    /// Symbol is empty
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Exchange identifier is empty or contains invalid characters
    #[error("invalid exchange id: {0:?}")]
    InvalidExchangeId(String),

    /// Interval is not one the exchanges understand
    #[error("unknown interval: {0}")]
    UnknownInterval(String),

    /// Channel name is unknown
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}
