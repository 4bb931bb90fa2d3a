//! Composite subscription key.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Channel, ExchangeId, Interval, Symbol};

/// Identifies one subscribable stream: `(exchange, channel, symbol, interval?)`.
///
/// The interval is present exactly when the channel is [`Channel::Candles`];
/// the constructors are the only way to build a topic, so that holds for
/// every value.
///
/// ```
/// use relay_core::types::{Channel, ExchangeId, Interval, Symbol, Topic};
///
/// let symbol = Symbol::new("BTCUSDT").unwrap();
/// let topic = Topic::candles(ExchangeId::bybit(), symbol, Interval::Minute1);
/// assert_eq!(topic.channel(), Channel::Candles);
/// assert_eq!(topic.to_string(), "bybit:candles:BTCUSDT:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic {
    exchange: ExchangeId,
    channel: Channel,
    symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<Interval>,
}

impl Topic {
    /// Public trades for `symbol`.
    #[must_use]
    pub fn trades(exchange: ExchangeId, symbol: Symbol) -> Self {
        Self {
            exchange,
            channel: Channel::Trades,
            symbol,
            interval: None,
        }
    }

    /// Order-book updates for `symbol`.
    #[must_use]
    pub fn orderbook(exchange: ExchangeId, symbol: Symbol) -> Self {
        Self {
            exchange,
            channel: Channel::OrderBook,
            symbol,
            interval: None,
        }
    }

    /// Candles of `interval` for `symbol`.
    #[must_use]
    pub fn candles(exchange: ExchangeId, symbol: Symbol, interval: Interval) -> Self {
        Self {
            exchange,
            channel: Channel::Candles,
            symbol,
            interval: Some(interval),
        }
    }

    /// Exchange the stream belongs to.
    #[must_use]
    pub fn exchange(&self) -> &ExchangeId {
        &self.exchange
    }

    /// Channel of the stream.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Instrument the stream is for.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Candle interval; `Some` only for candle topics.
    #[must_use]
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.exchange, self.channel, self.symbol)?;
        if let Some(interval) = self.interval {
            write!(f, ":{interval}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn btc() -> Symbol {
        Symbol::new("BTCUSDT").unwrap()
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let mut set = HashSet::new();
        set.insert(Topic::trades(ExchangeId::bybit(), btc()));
        set.insert(Topic::trades(ExchangeId::new("BYBIT").unwrap(), btc()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_channels_are_distinct_keys() {
        let trades = Topic::trades(ExchangeId::bybit(), btc());
        let book = Topic::orderbook(ExchangeId::bybit(), btc());
        assert_ne!(trades, book);
    }

    #[test]
    fn test_interval_only_for_candles() {
        assert!(Topic::trades(ExchangeId::bybit(), btc()).interval().is_none());
        let candles = Topic::candles(ExchangeId::bybit(), btc(), Interval::Hour1);
        assert_eq!(candles.interval(), Some(Interval::Hour1));
        assert_ne!(
            candles,
            Topic::candles(ExchangeId::bybit(), btc(), Interval::Minute1)
        );
    }

    #[test]
    fn test_display() {
        let topic = Topic::orderbook(ExchangeId::bybit(), btc());
        assert_eq!(topic.to_string(), "bybit:orderbook:BTCUSDT");
    }
}
