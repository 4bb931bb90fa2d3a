//! Reference-counted subscription broker.
//!
//! One broker sits between one exchange's stream connection and every
//! internal consumer of that exchange's market data. It keeps exactly one
//! upstream subscription per [`Topic`] no matter how many consumers share it,
//! fans each inbound frame out to all of them, and replays the desired set
//! whenever the connection comes back.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::error::{NetworkError, SubscriptionError};
use relay_core::events::{MarketEvent, StatusEvent};
use relay_core::traits::{
    ConsumerId, EventHandler, Normalizer, RawFrame, StreamObserver, StreamSink,
    SubscriptionAck, SubscriptionHandle, SubscriptionOp,
};
use relay_core::types::{ConnectionState, ExchangeId, Topic};
use relay_telemetry::spans::dispatch_span;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Capacity of the status event channel.
const STATUS_CHANNEL_CAPACITY: usize = 256;

/// Broker-side record of one upstream subscription.
struct Subscription {
    consumers: BTreeMap<ConsumerId, Arc<dyn EventHandler>>,
    acknowledged: bool,
    /// Connection epoch the last subscribe frame was sent on.
    sent_epoch: u64,
}

impl Subscription {
    fn new(sent_epoch: u64) -> Self {
        Self {
            consumers: BTreeMap::new(),
            acknowledged: false,
            sent_epoch,
        }
    }
}

/// Subscription broker for one exchange.
///
/// # Invariants
///
/// - A [`Subscription`] exists for a topic iff at least one consumer is
///   registered for it.
/// - The upstream subscribe frame is sent on the 0→1 consumer transition and
///   the unsubscribe frame on the 1→0 transition, under the same lock that
///   changes the count.
/// - Frames from a connection epoch older than the current one are dropped.
/// - A topic gets at most one subscribe frame per connection epoch; the
///   replay skips topics already subscribed on the new socket.
///
/// # Example
///
/// ```ignore
/// let broker = SubscriptionBroker::new(connection.clone(), Arc::new(BybitNormalizer::new()));
/// let observer: Arc<dyn StreamObserver> = broker.clone();
/// connection.set_observer(&observer);
///
/// let handle = broker.subscribe(topic, broker.next_consumer_id(), handler)?;
/// // ...
/// handle.unsubscribe();
/// ```
pub struct SubscriptionBroker {
    exchange: ExchangeId,
    sink: Arc<dyn StreamSink>,
    normalizer: Arc<dyn Normalizer>,
    subscriptions: Mutex<HashMap<Topic, Subscription>>,
    epoch: AtomicU64,
    next_consumer: AtomicU64,
    status_tx: broadcast::Sender<StatusEvent>,
}

impl SubscriptionBroker {
    /// Creates a broker that sends upstream frames through `sink` and turns
    /// raw frames into events with `normalizer`.
    pub fn new(sink: Arc<dyn StreamSink>, normalizer: Arc<dyn Normalizer>) -> Arc<Self> {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Arc::new(Self {
            exchange: sink.exchange().clone(),
            sink,
            normalizer,
            subscriptions: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
            next_consumer: AtomicU64::new(1),
            status_tx,
        })
    }

    /// Exchange this broker serves.
    #[must_use]
    pub fn exchange(&self) -> &ExchangeId {
        &self.exchange
    }

    /// Allocates a fresh consumer id.
    pub fn next_consumer_id(&self) -> ConsumerId {
        ConsumerId(self.next_consumer.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `consumer` for `topic`.
    ///
    /// The first consumer of a topic triggers the upstream subscribe frame.
    /// Registering the same consumer again replaces its handler.
    ///
    /// # Errors
    ///
    /// - [`SubscriptionError::ForeignTopic`] if the topic belongs to another exchange
    /// - [`SubscriptionError::NotConnected`] if a subscribe frame is needed but
    ///   the stream is not connected; nothing is recorded
    /// - [`SubscriptionError::UpstreamFailed`] if the frame could not be queued;
    ///   nothing is recorded
    pub fn subscribe(
        self: &Arc<Self>,
        topic: Topic,
        consumer: ConsumerId,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        if topic.exchange() != &self.exchange {
            return Err(SubscriptionError::ForeignTopic {
                topic: topic.to_string(),
                exchange: self.exchange.to_string(),
            });
        }

        let (consumers, added) = {
            let mut subscriptions = self.subscriptions.lock();
            if let Some(subscription) = subscriptions.get_mut(&topic) {
                let added = subscription.consumers.insert(consumer, handler).is_none();
                (subscription.consumers.len(), added)
            } else {
                if !self.sink.is_connected() {
                    return Err(SubscriptionError::NotConnected {
                        exchange: self.exchange.to_string(),
                    });
                }
                // Read before sending: a socket swap in between must leave
                // the topic looking stale so the replay picks it up.
                let sent_epoch = self.sink.epoch();
                self.sink
                    .send(&topic, SubscriptionOp::Subscribe)
                    .map_err(|e| self.upstream_error(&topic, e))?;

                let mut subscription = Subscription::new(sent_epoch);
                subscription.consumers.insert(consumer, handler);
                subscriptions.insert(topic.clone(), subscription);
                info!(topic = %topic, "Upstream subscription created");
                (1, true)
            }
        };

        if added {
            debug!(topic = %topic, consumer = %consumer, consumers, "Consumer subscribed");
            self.publish(StatusEvent::SubscriptionCountChanged {
                topic: topic.clone(),
                consumers,
            });
        }

        let broker = Arc::downgrade(self);
        let release_topic = topic.clone();
        Ok(SubscriptionHandle::new(topic, consumer, move || {
            if let Some(broker) = Weak::upgrade(&broker) {
                broker.unsubscribe(&release_topic, consumer);
            }
        }))
    }

    /// Removes `consumer` from `topic`.
    ///
    /// The last consumer leaving deletes the subscription and, when the sink
    /// supports targeted unsubscribe and is connected, sends the upstream
    /// unsubscribe frame. Returns false if the consumer was not registered.
    pub fn unsubscribe(&self, topic: &Topic, consumer: ConsumerId) -> bool {
        let consumers = {
            let mut subscriptions = self.subscriptions.lock();
            let Some(subscription) = subscriptions.get_mut(topic) else {
                return false;
            };
            if subscription.consumers.remove(&consumer).is_none() {
                return false;
            }

            let remaining = subscription.consumers.len();
            if remaining == 0 {
                subscriptions.remove(topic);
                if self.sink.supports_unsubscribe(topic.channel()) && self.sink.is_connected() {
                    if let Err(e) = self.sink.send(topic, SubscriptionOp::Unsubscribe) {
                        warn!(topic = %topic, error = %e, "Upstream unsubscribe failed");
                    }
                } else {
                    debug!(topic = %topic, "Dropping subscription locally");
                }
                info!(topic = %topic, "Upstream subscription removed");
            }
            remaining
        };

        debug!(topic = %topic, consumer = %consumer, consumers, "Consumer unsubscribed");
        self.publish(StatusEvent::SubscriptionCountChanged {
            topic: topic.clone(),
            consumers,
        });
        true
    }

    /// Normalizes `raw` and delivers the events to every consumer of `topic`.
    ///
    /// Handlers run outside the lock, in registration order. A failing or
    /// panicking handler is reported as [`StatusEvent::ConsumerFailed`] and
    /// does not affect the others.
    pub fn dispatch(&self, topic: &Topic, raw: &RawFrame) {
        let handlers: Vec<(ConsumerId, Arc<dyn EventHandler>)> = {
            let subscriptions = self.subscriptions.lock();
            match subscriptions.get(topic) {
                Some(subscription) => subscription
                    .consumers
                    .iter()
                    .map(|(id, handler)| (*id, Arc::clone(handler)))
                    .collect(),
                None => return,
            }
        };
        if handlers.is_empty() {
            return;
        }

        let span = dispatch_span(&topic.to_string());
        let _enter = span.enter();
        span.record("consumers", handlers.len());

        let events = match self.normalizer.normalize(topic, raw) {
            Ok(events) => events,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Dropping frame that failed to normalize");
                return;
            }
        };

        for event in &events {
            for (consumer, handler) in &handlers {
                self.deliver(topic, *consumer, handler.as_ref(), event);
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch), but drops frames whose epoch is
    /// older than the current connection epoch.
    pub fn dispatch_from(&self, epoch: u64, topic: &Topic, raw: &RawFrame) {
        let current = self.current_epoch();
        if epoch < current {
            trace!(topic = %topic, epoch, current, "Discarding stale frame");
            return;
        }
        self.dispatch(topic, raw);
    }

    /// Records a new connection epoch and replays the desired subscription set.
    ///
    /// Topics whose subscribe frame already went out on this epoch's socket
    /// (a `subscribe` that landed between the socket opening and this call)
    /// are not sent again.
    pub fn on_connected(&self, epoch: u64) {
        self.epoch.fetch_max(epoch, Ordering::SeqCst);

        let mut subscriptions = self.subscriptions.lock();
        let mut replayed = 0usize;
        let mut current = 0usize;
        for (topic, subscription) in subscriptions.iter_mut() {
            if subscription.sent_epoch >= epoch {
                current += 1;
                continue;
            }
            subscription.acknowledged = false;
            match self.sink.send(topic, SubscriptionOp::Subscribe) {
                Ok(()) => {
                    subscription.sent_epoch = epoch;
                    replayed += 1;
                }
                Err(e) => warn!(topic = %topic, error = %e, "Replay subscribe failed"),
            }
        }
        info!(exchange = %self.exchange, epoch, replayed, current, "Replayed subscriptions");
    }

    /// Applies a subscribe/unsubscribe acknowledgement.
    ///
    /// Acknowledgements do not name their topic, so a successful subscribe
    /// acknowledgement marks every pending subscription acknowledged.
    pub fn on_ack(&self, ack: &SubscriptionAck) {
        if !ack.success {
            self.publish(StatusEvent::ProtocolDiagnostic {
                exchange: self.exchange.clone(),
                message: ack.message.clone(),
            });
            return;
        }
        if ack.op == Some(SubscriptionOp::Unsubscribe) {
            return;
        }
        for subscription in self.subscriptions.lock().values_mut() {
            subscription.acknowledged = true;
        }
    }

    /// Topics that currently have consumers, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.subscriptions.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Number of consumers registered for `topic`.
    #[must_use]
    pub fn consumer_count(&self, topic: &Topic) -> usize {
        self.subscriptions
            .lock()
            .get(topic)
            .map_or(0, |s| s.consumers.len())
    }

    /// Whether the upstream acknowledged the subscription for `topic`.
    #[must_use]
    pub fn is_acknowledged(&self, topic: &Topic) -> bool {
        self.subscriptions
            .lock()
            .get(topic)
            .is_some_and(|s| s.acknowledged)
    }

    /// Current connection epoch.
    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Subscribes to status events.
    #[must_use]
    pub fn status_events(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    fn deliver(
        &self,
        topic: &Topic,
        consumer: ConsumerId,
        handler: &dyn EventHandler,
        event: &MarketEvent,
    ) {
        let result = catch_unwind(AssertUnwindSafe(|| handler.on_event(topic, event)));
        let reason = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
        };

        warn!(topic = %topic, consumer = %consumer, reason = %reason, "Consumer failed");
        self.publish(StatusEvent::ConsumerFailed {
            topic: topic.clone(),
            consumer,
            reason,
        });
    }

    fn upstream_error(&self, topic: &Topic, error: NetworkError) -> SubscriptionError {
        match error {
            NetworkError::NotConnected { .. } => SubscriptionError::NotConnected {
                exchange: self.exchange.to_string(),
            },
            other => SubscriptionError::UpstreamFailed {
                topic: topic.to_string(),
                reason: other.to_string(),
            },
        }
    }

    fn publish(&self, event: StatusEvent) {
        // No receivers is fine.
        let _ = self.status_tx.send(event);
    }
}

#[async_trait]
impl StreamObserver for SubscriptionBroker {
    async fn on_data(&self, epoch: u64, topic: Topic, raw: RawFrame) {
        self.dispatch_from(epoch, &topic, &raw);
    }

    async fn on_ack(&self, epoch: u64, ack: SubscriptionAck) {
        if epoch < self.current_epoch() {
            return;
        }
        SubscriptionBroker::on_ack(self, &ack);
    }

    async fn on_protocol_error(&self, _epoch: u64, message: String) {
        self.publish(StatusEvent::ProtocolDiagnostic {
            exchange: self.exchange.clone(),
            message,
        });
    }

    async fn on_state_change(&self, state: ConnectionState, epoch: u64) {
        info!(exchange = %self.exchange, state = %state, epoch, "Connection state changed");
        if state == ConnectionState::Connected {
            self.on_connected(epoch);
        }
        self.publish(StatusEvent::ConnectionStateChanged {
            exchange: self.exchange.clone(),
            state,
            epoch,
        });
    }
}

impl std::fmt::Debug for SubscriptionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionBroker")
            .field("exchange", &self.exchange)
            .field("topics", &self.subscriptions.lock().len())
            .field("epoch", &self.current_epoch())
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic.downcast_ref::<&str>().map_or_else(
        || {
            panic.downcast_ref::<String>().map_or_else(
                || "Unknown panic".to_string(),
                std::string::ToString::to_string,
            )
        },
        std::string::ToString::to_string,
    )
}
