//! Transport-level error types.
//!
//! Covers socket failures, handshake timeouts and HTTP transport errors.
//! Every variant except `InvalidUrl` is recoverable: the stream connection
//! answers them by entering the reconnecting state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network error type covering connection failures, timeouts and socket errors.
///
/// # Examples
///
/// ```
/// use relay_core::error::NetworkError;
///
/// let error = NetworkError::ConnectionFailed {
///     reason: "Connection refused".to_string(),
/// };
/// assert!(error.to_string().contains("Connection refused"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkError {
    /// Connection to remote host failed.
    #[error("[Network] Connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for the connection failure.
        reason: String,
    },

    /// Connection or request timed out.
    #[error("[Network] Connection timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Endpoint URL could not be parsed.
    #[error("[Network] Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// WebSocket error occurred.
    #[error("[Network] WebSocket error: {reason}")]
    WebSocket {
        /// Reason for the WebSocket error.
        reason: String,
    },

    /// HTTP request failed.
    #[error("[Network] HTTP error: status {status_code} - {reason}")]
    Http {
        /// HTTP status code (0 when no response was received).
        status_code: u16,
        /// Reason for the HTTP error.
        reason: String,
    },

    /// Connection was closed unexpectedly.
    #[error("[Network] Connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the connection closure.
        reason: String,
    },

    /// A frame was offered while the socket was not open.
    #[error("[Network] Not connected to {exchange}")]
    NotConnected {
        /// Exchange whose socket is not open.
        exchange: String,
    },
}

impl NetworkError {
    /// Returns true if this error is recoverable (can be retried).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl { .. })
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::InvalidUrl { .. } => ErrorSeverity::Fatal,
            Self::Timeout { .. }
            | Self::ConnectionFailed { .. }
            | Self::ConnectionClosed { .. }
            | Self::WebSocket { .. } => ErrorSeverity::Recoverable,
            Self::Http { status_code, .. } if *status_code >= 500 || *status_code == 0 => {
                ErrorSeverity::Recoverable
            }
            Self::Http { .. } => ErrorSeverity::Warning,
            Self::NotConnected { .. } => ErrorSeverity::Info,
        }
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Timeout { timeout_ms } => Some(*timeout_ms / 2),
            Self::ConnectionFailed { .. } | Self::ConnectionClosed { .. } => Some(5000),
            Self::WebSocket { .. } => Some(500),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    #[test]
    fn test_connection_failed() {
        let error = NetworkError::ConnectionFailed {
            reason: "Connection refused".to_string(),
        };
        assert!(error.to_string().contains("Connection refused"));
        assert!(error.is_recoverable());
        assert_eq!(error.suggested_retry_delay_ms(), Some(5000));
    }

    #[test]
    fn test_timeout() {
        let error = NetworkError::Timeout { timeout_ms: 5000 };
        assert!(error.to_string().contains("5000ms"));
        assert!(error.is_recoverable());
        assert_eq!(error.suggested_retry_delay_ms(), Some(2500));
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let error = NetworkError::InvalidUrl {
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert!(!error.is_recoverable());
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_http_severity_by_status() {
        let server = NetworkError::Http {
            status_code: 502,
            reason: "bad gateway".to_string(),
        };
        let client = NetworkError::Http {
            status_code: 404,
            reason: "not found".to_string(),
        };
        assert_eq!(server.severity(), ErrorSeverity::Recoverable);
        assert_eq!(client.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_not_connected_message() {
        let error = NetworkError::NotConnected {
            exchange: "bybit".to_string(),
        };
        assert_eq!(error.to_string(), "[Network] Not connected to bybit");
    }
}
