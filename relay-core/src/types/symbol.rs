//! Symbol type for representing instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Instrument identifier in the exchange's own spelling, e.g. `BTCUSDT`.
///
/// Symbols never contain `.`, which separates segments of stream topic
/// strings.
///
/// # Examples
///
/// ```
/// use relay_core::types::Symbol;
///
/// let symbol = Symbol::new("BTCUSDT").unwrap();
/// assert_eq!(symbol.as_str(), "BTCUSDT");
/// assert!(Symbol::new("BTC.USDT").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new `Symbol` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySymbol` if the string is empty.
    /// Returns `ValidationError::InvalidSymbol` if it contains anything other
    /// than ASCII alphanumerics, `-` or `_`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if !Self::valid_chars(&s) {
            return Err(ValidationError::InvalidSymbol(s));
        }
        Ok(Self(s))
    }

    fn valid_chars(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_new_valid() {
        let symbol = Symbol::new("ETHUSDT").unwrap();
        assert_eq!(symbol.as_str(), "ETHUSDT");
        assert_eq!(symbol.to_string(), "ETHUSDT");
    }

    #[test]
    fn test_symbol_new_empty() {
        assert!(matches!(Symbol::new(""), Err(ValidationError::EmptySymbol)));
    }

    #[test]
    fn test_symbol_rejects_topic_separator() {
        let result = Symbol::new("BTC.USDT");
        assert!(matches!(result, Err(ValidationError::InvalidSymbol(_))));
    }

    #[test]
    fn test_symbol_deserialize_validates() {
        let ok: Symbol = serde_json::from_str("\"BTCUSDT\"").unwrap();
        assert_eq!(ok.as_str(), "BTCUSDT");
        assert!(serde_json::from_str::<Symbol>("\"BTC USDT\"").is_err());
    }
}
