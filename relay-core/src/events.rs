//! Events delivered to consumers and status observers.

use serde::{Deserialize, Serialize};

use crate::data::{Candle, OrderBook, Trade};
use crate::traits::ConsumerId;
use crate::types::{ConnectionState, ExchangeId, Topic};

/// Normalized payload fanned out to the consumers of a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum MarketEvent {
    /// A public trade.
    Trade(Trade),
    /// A candle update.
    Candle(Candle),
    /// An order-book snapshot or delta.
    #[serde(rename = "orderbook")]
    OrderBook(OrderBook),
}

impl MarketEvent {
    /// Returns the trade, if this is a trade event.
    #[must_use]
    pub fn as_trade(&self) -> Option<&Trade> {
        match self {
            Self::Trade(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the candle, if this is a candle event.
    #[must_use]
    pub fn as_candle(&self) -> Option<&Candle> {
        match self {
            Self::Candle(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the order book, if this is an order-book event.
    #[must_use]
    pub fn as_orderbook(&self) -> Option<&OrderBook> {
        match self {
            Self::OrderBook(b) => Some(b),
            _ => None,
        }
    }
}

/// Observable status changes, published so a UI can reflect connection and
/// subscription state without polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The stream connection changed state.
    ConnectionStateChanged {
        /// Exchange whose connection changed.
        exchange: ExchangeId,
        /// New state.
        state: ConnectionState,
        /// Connection epoch at the time of the change.
        epoch: u64,
    },
    /// The number of consumers of a topic changed.
    SubscriptionCountChanged {
        /// Topic whose consumer set changed.
        topic: Topic,
        /// Consumers after the change.
        consumers: usize,
    },
    /// The exchange reported a protocol-level problem (for example a
    /// rejected subscribe or unsubscribe request).
    ProtocolDiagnostic {
        /// Exchange that reported it.
        exchange: ExchangeId,
        /// Exchange message.
        message: String,
    },
    /// A consumer's handler failed while receiving an event.
    ConsumerFailed {
        /// Topic being dispatched.
        topic: Topic,
        /// Consumer whose handler failed.
        consumer: ConsumerId,
        /// Error or panic message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Side, Trade};
    use crate::types::Symbol;

    #[test]
    fn test_market_event_accessors() {
        let event = MarketEvent::Trade(Trade {
            id: "1".to_string(),
            symbol: Symbol::new("BTCUSDT").unwrap(),
            price: 1.0,
            quantity: 2.0,
            side: Side::Sell,
            time: 3,
        });
        assert!(event.as_trade().is_some());
        assert!(event.as_candle().is_none());
        assert!(event.as_orderbook().is_none());
    }

    #[test]
    fn test_status_event_serializes_tagged() {
        let event = StatusEvent::ConnectionStateChanged {
            exchange: ExchangeId::bybit(),
            state: ConnectionState::Reconnecting,
            epoch: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "connection_state_changed");
        assert_eq!(json["state"], "reconnecting");
        assert_eq!(json["exchange"], "bybit");
    }
}
