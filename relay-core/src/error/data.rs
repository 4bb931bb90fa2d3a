//! Data-related error types.
//!
//! Raised while decoding protocol frames and normalizing exchange payloads.
//! None of these are fatal to a connection; the offending frame is dropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Data error type covering frame parsing and payload normalization failures.
///
/// # Examples
///
/// ```
/// use relay_core::error::DataError;
///
/// let error = DataError::ParseFailed {
///     field: "price".to_string(),
///     reason: "not a number".to_string(),
/// };
/// assert!(error.to_string().contains("price"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataError {
    /// Failed to parse a field.
    #[error("[Data] Parse failed for field '{field}': {reason}")]
    ParseFailed {
        /// Field that failed to parse.
        field: String,
        /// Reason for the parse failure.
        reason: String,
    },

    /// Required data is missing.
    #[error("[Data] Missing data: {description}")]
    MissingData {
        /// Description of the missing data.
        description: String,
    },

    /// JSON serialization/deserialization error.
    #[error("[Data] JSON error: {reason}")]
    JsonError {
        /// Reason for the JSON error.
        reason: String,
    },

    /// Payload shape does not match the channel it arrived on.
    #[error("[Data] Unexpected payload for {topic}: {reason}")]
    UnexpectedPayload {
        /// Topic the payload was routed to.
        topic: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A topic string could not be mapped back to a structured topic.
    #[error("[Data] Unknown topic: {topic}")]
    UnknownTopic {
        /// The raw topic string.
        topic: String,
    },
}

impl DataError {
    /// Returns true if this error is recoverable.
    ///
    /// Data errors only ever cost the frame that caused them.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Warning
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    #[must_use]
    pub fn suggested_retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let data_err = DataError::from(err);
        assert!(matches!(data_err, DataError::JsonError { .. }));
        assert!(data_err.is_recoverable());
    }

    #[test]
    fn test_unknown_topic_message() {
        let err = DataError::UnknownTopic {
            topic: "tickers.BTCUSDT".to_string(),
        };
        assert_eq!(err.to_string(), "[Data] Unknown topic: tickers.BTCUSDT");
    }
}
