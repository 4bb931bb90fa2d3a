//! Error types and handling framework.
//!
//! This module provides a hierarchical error type system with
//! domain-specific error categories.
//!
//! # Error Hierarchy
//!
//! - RelayError - Top-level error type
//!   - NetworkError - Socket and HTTP transport errors
//!   - ExchangeError - Exchange API errors (auth, rate limits, envelopes)
//!   - DataError - Frame parsing and normalization errors
//!   - SubscriptionError - Broker errors returned to consumers
//!   - ConfigError - Configuration errors
//!
//! ```
//! use relay_core::error::{NetworkError, RelayError};
//!
//! let error: RelayError = NetworkError::Timeout { timeout_ms: 5000 }.into();
//! assert!(error.is_recoverable());
//! assert_eq!(error.category(), "network");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error severity levels for categorizing errors.
///
/// - `Fatal`: Unrecoverable errors that require immediate attention
/// - `Recoverable`: Errors that can be retried or recovered from
/// - `Warning`: Non-critical issues that should be logged
/// - `Info`: Informational messages about expected conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable error requiring immediate attention.
    Fatal,

    /// Error that can potentially be recovered from through retry or fallback.
    #[default]
    Recoverable,

    /// Non-critical issue that should be logged but doesn't prevent operation.
    Warning,

    /// Informational message about an expected or handled condition.
    Info,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal (unrecoverable).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod config;
mod data;
mod exchange;
mod network;
mod subscription;

pub use config::ConfigError;
pub use data::DataError;
pub use exchange::ExchangeError;
pub use network::NetworkError;
pub use subscription::SubscriptionError;

/// Top-level error type for the relay crates.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayError {
    /// Network-related error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// Exchange API error.
    #[error("{0}")]
    Exchange(#[from] ExchangeError),

    /// Data parsing or normalization error.
    #[error("{0}")]
    Data(#[from] DataError),

    /// Subscription broker error.
    #[error("{0}")]
    Subscription(#[from] SubscriptionError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl RelayError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(e) => e.severity(),
            Self::Exchange(e) => e.severity(),
            Self::Data(e) => e.severity(),
            Self::Subscription(e) => e.severity(),
            Self::Config(e) => e.severity(),
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_recoverable(),
            Self::Exchange(e) => e.is_recoverable(),
            Self::Data(e) => e.is_recoverable(),
            Self::Subscription(e) => e.is_recoverable(),
            Self::Config(e) => e.is_recoverable(),
        }
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Network(e) => e.suggested_retry_delay_ms(),
            Self::Exchange(e) => e.suggested_retry_delay_ms(),
            Self::Data(e) => e.suggested_retry_delay_ms(),
            Self::Subscription(e) => e.suggested_retry_delay_ms(),
            Self::Config(e) => e.suggested_retry_delay_ms(),
        }
    }

    /// Returns the error category as a string.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Exchange(_) => "exchange",
            Self::Data(_) => "data",
            Self::Subscription(_) => "subscription",
            Self::Config(_) => "config",
        }
    }

    /// Returns the inner network error, if this is a network error.
    #[must_use]
    pub fn as_network_error(&self) -> Option<&NetworkError> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the inner exchange error, if this is an exchange error.
    #[must_use]
    pub fn as_exchange_error(&self) -> Option<&ExchangeError> {
        match self {
            Self::Exchange(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the inner subscription error, if this is a subscription error.
    #[must_use]
    pub fn as_subscription_error(&self) -> Option<&SubscriptionError> {
        match self {
            Self::Subscription(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "RECOVERABLE");
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARNING");
        assert_eq!(ErrorSeverity::Info.to_string(), "INFO");
    }

    #[test]
    fn test_network_error_conversion() {
        let network_err = NetworkError::Timeout { timeout_ms: 5000 };
        let err: RelayError = network_err.clone().into();
        assert_eq!(err.category(), "network");
        assert_eq!(err.as_network_error(), Some(&network_err));
        assert!(err.as_exchange_error().is_none());
    }

    #[test]
    fn test_auth_error_is_not_recoverable() {
        let err: RelayError = ExchangeError::AuthenticationFailed {
            reason: "missing credentials".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(err.severity().is_fatal());
    }

    #[test]
    fn test_subscription_error_conversion() {
        let err: RelayError = SubscriptionError::NotConnected {
            exchange: "bybit".to_string(),
        }
        .into();
        assert_eq!(err.category(), "subscription");
        assert!(err.as_subscription_error().is_some());
        assert_eq!(err.suggested_retry_delay_ms(), Some(1000));
    }

    #[test]
    fn test_display_is_transparent() {
        let err = RelayError::Network(NetworkError::Timeout { timeout_ms: 5000 });
        assert_eq!(err.to_string(), "[Network] Connection timeout after 5000ms");
    }
}
