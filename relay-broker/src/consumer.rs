//! Channel-backed consumer for stream-style consumption.

use relay_core::events::MarketEvent;
use relay_core::traits::{EventHandler, HandlerError};
use relay_core::types::Topic;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// One event delivered to a [`ChannelConsumer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerMessage {
    /// Topic the event arrived on.
    pub topic: Topic,
    /// Normalized event.
    pub event: MarketEvent,
}

/// Event handler that forwards events into a bounded tokio channel.
///
/// Delivery never blocks the dispatching task: a full queue or a dropped
/// receiver is reported as a handler error, which the broker surfaces as a
/// `ConsumerFailed` status event.
///
/// ```ignore
/// let (consumer, mut rx) = ChannelConsumer::channel(1024);
/// let _handle = exchange.subscribe_trades(&symbol, consumer)?;
/// while let Some(message) = rx.recv().await {
///     println!("{}: {:?}", message.topic, message.event);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<ConsumerMessage>,
}

impl ChannelConsumer {
    /// Creates a consumer and the receiver its events arrive on.
    #[must_use]
    pub fn channel(capacity: usize) -> (Arc<Self>, mpsc::Receiver<ConsumerMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Arc::new(Self { tx }), rx)
    }

    /// Returns true once the receiver has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventHandler for ChannelConsumer {
    fn on_event(&self, topic: &Topic, event: &MarketEvent) -> Result<(), HandlerError> {
        let message = ConsumerMessage {
            topic: topic.clone(),
            event: event.clone(),
        };
        self.tx.try_send(message).map_err(|e| -> HandlerError {
            match e {
                TrySendError::Full(_) => "consumer queue full, event dropped".into(),
                TrySendError::Closed(_) => "consumer receiver dropped".into(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::data::{Side, Trade};
    use relay_core::types::{ExchangeId, Symbol};

    fn trade(price: f64) -> MarketEvent {
        MarketEvent::Trade(Trade {
            id: "1".to_string(),
            symbol: Symbol::new("BTCUSDT").unwrap(),
            price,
            quantity: 1.0,
            side: Side::Buy,
            time: 0,
        })
    }

    fn topic() -> Topic {
        Topic::trades(ExchangeId::bybit(), Symbol::new("BTCUSDT").unwrap())
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (consumer, mut rx) = ChannelConsumer::channel(8);
        consumer.on_event(&topic(), &trade(1.0)).unwrap();
        consumer.on_event(&topic(), &trade(2.0)).unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.topic, topic());
        assert_eq!(first.event, trade(1.0));
        assert_eq!(second.event, trade(2.0));
    }

    #[test]
    fn test_full_queue_is_an_error() {
        let (consumer, _rx) = ChannelConsumer::channel(1);
        consumer.on_event(&topic(), &trade(1.0)).unwrap();
        let err = consumer.on_event(&topic(), &trade(2.0)).unwrap_err();
        assert!(err.to_string().contains("full"));
    }

    #[test]
    fn test_dropped_receiver_is_an_error() {
        let (consumer, rx) = ChannelConsumer::channel(1);
        drop(rx);
        assert!(consumer.is_closed());
        assert!(consumer.on_event(&topic(), &trade(1.0)).is_err());
    }
}
