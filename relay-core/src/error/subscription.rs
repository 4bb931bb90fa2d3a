//! Subscription-related error types.
//!
//! Returned by the subscription broker to the consumer that asked for a
//! topic. Not-connected usage is an explicit result, never a panic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subscription error type.
///
/// # Examples
///
/// ```
/// use relay_core::error::SubscriptionError;
///
/// let error = SubscriptionError::NotConnected {
///     exchange: "bybit".to_string(),
/// };
/// assert!(error.to_string().contains("bybit"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionError {
    /// The exchange stream is not connected, so no subscribe frame could be sent.
    #[error("[Subscription] Exchange '{exchange}' is not connected")]
    NotConnected {
        /// Exchange identifier.
        exchange: String,
    },

    /// The stream connection refused to enqueue the subscribe frame.
    #[error("[Subscription] Upstream request for '{topic}' failed: {reason}")]
    UpstreamFailed {
        /// Topic the request was for.
        topic: String,
        /// Reason reported by the stream connection.
        reason: String,
    },

    /// The exchange rejected a subscribe or unsubscribe request.
    #[error("[Subscription] Exchange rejected request: {reason}")]
    UpstreamRejected {
        /// Message from the exchange.
        reason: String,
    },

    /// The topic does not belong to the exchange it was offered to.
    #[error("[Subscription] Topic '{topic}' does not belong to exchange '{exchange}'")]
    ForeignTopic {
        /// Topic string.
        topic: String,
        /// Exchange that owns the broker.
        exchange: String,
    },
}

impl SubscriptionError {
    /// Returns true if this error is recoverable (can be retried).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::UpstreamFailed { .. })
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::NotConnected { .. } | Self::UpstreamFailed { .. } => ErrorSeverity::Recoverable,
            Self::UpstreamRejected { .. } | Self::ForeignTopic { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::NotConnected { .. } => Some(1000),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_is_recoverable() {
        let error = SubscriptionError::NotConnected {
            exchange: "bybit".to_string(),
        };
        assert!(error.is_recoverable());
        assert_eq!(error.suggested_retry_delay_ms(), Some(1000));
    }

    #[test]
    fn test_rejected_is_not_recoverable() {
        let error = SubscriptionError::UpstreamRejected {
            reason: "handler not found".to_string(),
        };
        assert!(!error.is_recoverable());
    }
}
