//! Candlestick records.

use serde::{Deserialize, Serialize};

/// OHLCV candle. `time` is the start of the interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Candle {
    /// Interval start (ms).
    pub time: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing (or latest) price.
    pub close: f64,
    /// Volume in base units.
    pub volume: f64,
    /// Turnover in quote units.
    #[serde(default)]
    pub turnover: f64,
    /// True once the interval has closed. Historical candles are always
    /// confirmed; streamed candles flip to confirmed on their last update.
    #[serde(default)]
    pub confirmed: bool,
}

impl Candle {
    /// Returns true if the close is above the open.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// High minus low.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_helpers() {
        let candle = Candle {
            time: 1_700_000_000_000,
            open: 100.0,
            high: 110.0,
            low: 95.0,
            close: 105.0,
            volume: 12.0,
            turnover: 1260.0,
            confirmed: true,
        };
        assert!(candle.is_bullish());
        assert_eq!(candle.range(), 15.0);
    }
}
