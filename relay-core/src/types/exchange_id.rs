//! Exchange identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Lowercase exchange identifier, e.g. `bybit`.
///
/// Input is lowercased on construction so `"Bybit"` and `"bybit"` name the
/// same exchange.
///
/// ```
/// use relay_core::types::ExchangeId;
///
/// assert_eq!(ExchangeId::new("Bybit").unwrap(), ExchangeId::bybit());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Creates an identifier, lowercasing the input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidExchangeId` for empty input or input
    /// containing characters other than ASCII alphanumerics, `-` and `_`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref();
        if raw.is_empty()
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidExchangeId(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// The Bybit exchange.
    #[must_use]
    pub fn bybit() -> Self {
        Self("bybit".to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExchangeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ExchangeId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExchangeId> for String {
    fn from(id: ExchangeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        let id = ExchangeId::new("BYBIT").unwrap();
        assert_eq!(id.as_str(), "bybit");
    }

    #[test]
    fn test_rejects_empty_and_spaces() {
        assert!(ExchangeId::new("").is_err());
        assert!(ExchangeId::new("by bit").is_err());
    }
}
