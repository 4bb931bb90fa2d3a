//! Exchange-related error types.
//!
//! Errors reported by an exchange's REST surface: authentication problems,
//! rate limiting and application-level error envelopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exchange error type covering authentication failures, rate limiting
/// and errors reported inside the exchange's response envelope.
///
/// # Examples
///
/// ```
/// use relay_core::error::ExchangeError;
///
/// let error = ExchangeError::RateLimited { retry_after_ms: 1000 };
/// assert!(error.to_string().contains("1000ms"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeError {
    /// Authentication with the exchange failed, or credentials are missing
    /// for a private endpoint.
    #[error("[Exchange] Authentication failed: {reason}")]
    AuthenticationFailed {
        /// Reason for the authentication failure.
        reason: String,
    },

    /// API rate limit exceeded.
    #[error("[Exchange] Rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Time to wait before retrying in milliseconds.
        retry_after_ms: u64,
    },

    /// Invalid parameter provided.
    #[error("[Exchange] Invalid parameter: {param} - {reason}")]
    InvalidParameter {
        /// Parameter name that was invalid.
        param: String,
        /// Reason why the parameter is invalid.
        reason: String,
    },

    /// The exchange answered with a non-zero return code.
    #[error("[Exchange] API error: code={code}, message={message}")]
    Api {
        /// Return code from the exchange.
        code: i64,
        /// Message from the exchange.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("[Exchange] Invalid response from {endpoint}: {reason}")]
    InvalidResponse {
        /// Endpoint that produced the response.
        endpoint: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The requested operation is not offered by this exchange.
    #[error("[Exchange] Unsupported operation on {exchange}: {operation}")]
    Unsupported {
        /// Exchange identifier.
        exchange: String,
        /// Operation name.
        operation: String,
    },
}

impl ExchangeError {
    /// Returns true if this error is recoverable (can be retried).
    ///
    /// Authentication failures are never retried automatically.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::AuthenticationFailed { .. } => ErrorSeverity::Fatal,
            Self::RateLimited { .. } => ErrorSeverity::Recoverable,
            Self::InvalidParameter { .. }
            | Self::Api { .. }
            | Self::InvalidResponse { .. }
            | Self::Unsupported { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// Returns true if this is an authentication failure.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}
