//! Public trade prints.

use serde::{Deserialize, Serialize};

use crate::types::Symbol;

/// Aggressor side of a trade, or side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    /// Buyer was the aggressor.
    Buy,
    /// Seller was the aggressor.
    Sell,
    /// The exchange did not say.
    #[default]
    Unknown,
}

impl Side {
    /// Parses the exchange spelling (`Buy`/`Sell`, case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("buy") {
            Self::Buy
        } else if value.eq_ignore_ascii_case("sell") {
            Self::Sell
        } else {
            Self::Unknown
        }
    }

    /// Returns true for [`Side::Buy`].
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

/// A single public trade.
///
/// ```
/// use relay_core::data::{Side, Trade};
/// use relay_core::types::Symbol;
///
/// let trade = Trade {
///     id: "t-1".to_string(),
///     symbol: Symbol::new("BTCUSDT").unwrap(),
///     price: 50000.0,
///     quantity: 0.1,
///     side: Side::Buy,
///     time: 1_234_567_890,
/// };
/// assert_eq!(trade.notional(), 5000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade id.
    pub id: String,
    /// Instrument.
    pub symbol: Symbol,
    /// Execution price.
    pub price: f64,
    /// Executed quantity in base units.
    pub quantity: f64,
    /// Aggressor side.
    pub side: Side,
    /// Execution time (ms).
    pub time: i64,
}

impl Trade {
    /// Price times quantity.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("Buy"), Side::Buy);
        assert_eq!(Side::parse("SELL"), Side::Sell);
        assert_eq!(Side::parse(""), Side::Unknown);
    }

    #[test]
    fn test_side_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"Buy\"");
    }
}
