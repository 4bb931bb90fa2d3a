//! Consumer handlers and subscription handles.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::events::MarketEvent;
use crate::types::Topic;

/// Opaque consumer identity. Used only for set membership and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(pub u64);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer-{}", self.0)
    }
}

/// Error a handler may return. It is logged and reported, never propagated
/// to other consumers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the normalized events of the topics a consumer subscribed to.
///
/// Handlers run on the connection's dispatch path and should return quickly;
/// consumers with heavy work should forward into a channel.
pub trait EventHandler: Send + Sync {
    /// Called once per normalized event, in arrival order.
    fn on_event(&self, topic: &Topic, event: &MarketEvent) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Topic, &MarketEvent) -> Result<(), HandlerError> + Send + Sync,
{
    fn on_event(&self, topic: &Topic, event: &MarketEvent) -> Result<(), HandlerError> {
        self(topic, event)
    }
}

/// Wraps a closure as a shareable handler.
///
/// ```
/// use relay_core::traits::handler_fn;
///
/// let handler = handler_fn(|_topic, event| {
///     let _ = event.as_trade();
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&Topic, &MarketEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

type Release = Box<dyn FnOnce() + Send>;

/// Undoes exactly one consumer registration.
///
/// [`unsubscribe`](Self::unsubscribe) is idempotent: the first call releases
/// the registration, later calls do nothing. Dropping the handle does not
/// unsubscribe.
pub struct SubscriptionHandle {
    topic: Topic,
    consumer: ConsumerId,
    release: Mutex<Option<Release>>,
}

impl SubscriptionHandle {
    /// Creates a handle that runs `release` on the first `unsubscribe`.
    pub fn new(topic: Topic, consumer: ConsumerId, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic,
            consumer,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Topic this handle is registered on.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Consumer this handle registered.
    #[must_use]
    pub fn consumer(&self) -> ConsumerId {
        self.consumer
    }

    /// Returns true until `unsubscribe` has been called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.lock().is_some()
    }

    /// Removes the registration. Returns true on the call that actually
    /// released it.
    pub fn unsubscribe(&self) -> bool {
        let release = self.release.lock().take();
        match release {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("topic", &self.topic)
            .field("consumer", &self.consumer)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExchangeId, Symbol};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn topic() -> Topic {
        Topic::trades(ExchangeId::bybit(), Symbol::new("BTCUSDT").unwrap())
    }

    #[test]
    fn test_unsubscribe_runs_release_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = SubscriptionHandle::new(topic(), ConsumerId(7), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.is_active());
        assert!(handle.unsubscribe());
        assert!(!handle.unsubscribe());
        assert!(!handle.is_active());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.consumer(), ConsumerId(7));
    }

    #[test]
    fn test_drop_does_not_release() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = SubscriptionHandle::new(topic(), ConsumerId(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_closure_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let handler = handler_fn(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let event = MarketEvent::Candle(crate::data::Candle::default());
        handler.on_event(&topic(), &event).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
