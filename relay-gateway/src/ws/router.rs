//! Mapping between structured topics and exchange topic strings.

use relay_core::types::{Channel, ExchangeId, Interval, Symbol, Topic};

const TRADE_PREFIX: &str = "publicTrade";
const ORDERBOOK_PREFIX: &str = "orderbook";
const KLINE_PREFIX: &str = "kline";

/// Default order-book depth requested in topic strings.
pub const DEFAULT_ORDERBOOK_DEPTH: u32 = 200;

/// Formats topics into `publicTrade.{symbol}`, `orderbook.{depth}.{symbol}`
/// and `kline.{interval}.{symbol}` strings and parses them back.
///
/// ```
/// use relay_core::types::{ExchangeId, Symbol, Topic};
/// use relay_gateway::ws::TopicRouter;
///
/// let router = TopicRouter::new(ExchangeId::bybit());
/// let topic = Topic::orderbook(ExchangeId::bybit(), Symbol::new("ETHUSDT").unwrap());
/// assert_eq!(router.format(&topic), "orderbook.200.ETHUSDT");
/// assert_eq!(router.parse("orderbook.200.ETHUSDT"), Some(topic));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRouter {
    exchange: ExchangeId,
    orderbook_depth: u32,
}

impl TopicRouter {
    /// Router for `exchange` with the default order-book depth.
    #[must_use]
    pub fn new(exchange: ExchangeId) -> Self {
        Self {
            exchange,
            orderbook_depth: DEFAULT_ORDERBOOK_DEPTH,
        }
    }

    /// Sets the depth used when formatting order-book topics.
    #[must_use]
    pub fn with_orderbook_depth(mut self, depth: u32) -> Self {
        self.orderbook_depth = depth;
        self
    }

    /// Exchange whose topics this router parses.
    #[must_use]
    pub fn exchange(&self) -> &ExchangeId {
        &self.exchange
    }

    /// Depth used for order-book topic strings.
    #[must_use]
    pub fn orderbook_depth(&self) -> u32 {
        self.orderbook_depth
    }

    /// Formats `topic` as a wire topic string.
    #[must_use]
    pub fn format(&self, topic: &Topic) -> String {
        let symbol = topic.symbol();
        match (topic.channel(), topic.interval()) {
            (Channel::Trades, _) => format!("{TRADE_PREFIX}.{symbol}"),
            (Channel::OrderBook, _) => {
                format!("{ORDERBOOK_PREFIX}.{}.{symbol}", self.orderbook_depth)
            }
            (Channel::Candles, Some(interval)) => format!("{KLINE_PREFIX}.{interval}.{symbol}"),
            // Topic::candles always carries an interval.
            (Channel::Candles, None) => format!("{KLINE_PREFIX}.{symbol}"),
        }
    }

    /// Parses a wire topic string. Returns `None` for anything that is not
    /// a well-formed trade, order-book or kline topic, and for order-book
    /// topics at a depth other than [`orderbook_depth`](Self::orderbook_depth).
    #[must_use]
    pub fn parse(&self, value: &str) -> Option<Topic> {
        let segments: Vec<&str> = value.split('.').collect();
        match segments.as_slice() {
            [TRADE_PREFIX, symbol] => {
                let symbol = Symbol::new(*symbol).ok()?;
                Some(Topic::trades(self.exchange.clone(), symbol))
            }
            [ORDERBOOK_PREFIX, depth, symbol] => {
                if depth.parse::<u32>().ok()? != self.orderbook_depth {
                    return None;
                }
                let symbol = Symbol::new(*symbol).ok()?;
                Some(Topic::orderbook(self.exchange.clone(), symbol))
            }
            [KLINE_PREFIX, interval, symbol] => {
                let interval: Interval = interval.parse().ok()?;
                let symbol = Symbol::new(*symbol).ok()?;
                Some(Topic::candles(self.exchange.clone(), symbol, interval))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> TopicRouter {
        TopicRouter::new(ExchangeId::bybit())
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    #[test]
    fn test_round_trip_every_channel() {
        let router = router();
        let mut topics = vec![
            Topic::trades(ExchangeId::bybit(), symbol("BTCUSDT")),
            Topic::orderbook(ExchangeId::bybit(), symbol("ETHUSDT")),
        ];
        topics.extend(
            Interval::ALL
                .iter()
                .map(|i| Topic::candles(ExchangeId::bybit(), symbol("SOLUSDT"), *i)),
        );

        for topic in topics {
            let text = router.format(&topic);
            assert_eq!(router.parse(&text), Some(topic), "{text}");
            assert_eq!(router.format(&router.parse(&text).unwrap()), text);
        }
    }

    #[test]
    fn test_format_strings() {
        let router = router();
        assert_eq!(
            router.format(&Topic::trades(ExchangeId::bybit(), symbol("BTCUSDT"))),
            "publicTrade.BTCUSDT"
        );
        assert_eq!(
            router.format(&Topic::candles(
                ExchangeId::bybit(),
                symbol("BTCUSDT"),
                Interval::Day1
            )),
            "kline.D.BTCUSDT"
        );
    }

    #[test]
    fn test_custom_depth() {
        let router = router().with_orderbook_depth(50);
        let topic = Topic::orderbook(ExchangeId::bybit(), symbol("BTCUSDT"));
        assert_eq!(router.format(&topic), "orderbook.50.BTCUSDT");
        assert_eq!(router.parse("orderbook.50.BTCUSDT"), Some(topic));
        assert_eq!(router.parse("orderbook.200.BTCUSDT"), None);
    }

    #[test]
    fn test_other_depths_are_not_the_subscribed_book() {
        let router = router();
        let topic = Topic::orderbook(ExchangeId::bybit(), symbol("BTCUSDT"));
        assert_eq!(router.parse("orderbook.200.BTCUSDT"), Some(topic));
        for other in ["orderbook.1.BTCUSDT", "orderbook.50.BTCUSDT", "orderbook.200x.BTCUSDT"] {
            assert_eq!(router.parse(other), None, "{other}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let router = router();
        for bad in [
            "",
            "tickers.BTCUSDT",
            "publicTrade",
            "publicTrade.BTC.USDT",
            "orderbook.BTCUSDT",
            "orderbook.deep.BTCUSDT",
            "kline.7.BTCUSDT",
            "kline.1",
            "publicTrade.BTC/USDT",
        ] {
            assert_eq!(router.parse(bad), None, "{bad}");
        }
    }
}
