//! Stream connection with automatic reconnection and heartbeat.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use relay_core::error::NetworkError;
use relay_core::traits::{RawFrame, StreamObserver, StreamSink, SubscriptionOp};
use relay_core::types::{ConnectionState, ExchangeId, Topic};
use std::sync::{Arc, Weak};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{Instrument, debug, info, trace, warn};

use super::config::WebSocketConfig;
use super::message::{InboundFrame, OutboundFrame};
use super::router::TopicRouter;
use super::state::InternalState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// How a socket session ended.
#[derive(Debug)]
enum SessionEnd {
    /// `disconnect()` was called.
    Shutdown,
    /// The transport failed; reconnect unless attempts are exhausted.
    Failed(String),
}

struct Inner {
    exchange: ExchangeId,
    state: RwLock<InternalState>,
    send_tx: RwLock<Option<mpsc::Sender<String>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    observer: RwLock<Option<Weak<dyn StreamObserver>>>,
    /// Held across a state transition and its notification.
    transition_lock: tokio::sync::Mutex<()>,
}

impl Inner {
    fn observer(&self) -> Option<Arc<dyn StreamObserver>> {
        self.observer.read().as_ref().and_then(Weak::upgrade)
    }

    async fn notify(&self, state: ConnectionState, epoch: u64) {
        info!(exchange = %self.exchange, state = %state, epoch, "Stream state changed");
        if let Some(observer) = self.observer() {
            observer.on_state_change(state, epoch).await;
        }
    }

    /// Stops the running session, or the handshake in flight.
    fn signal_shutdown(&self) {
        if let Some(shutdown_tx) = self.shutdown_tx.lock().take() {
            let _ = shutdown_tx.try_send(());
        }
    }

    /// Installs a fresh outbound queue and moves to Connected.
    ///
    /// Returns `None` without touching anything if the state is no longer
    /// `expected`, i.e. `disconnect()` won the race with the handshake.
    async fn on_open(
        &self,
        capacity: usize,
        expected: ConnectionState,
    ) -> Option<(u64, mpsc::Receiver<String>)> {
        let (send_tx, send_rx) = mpsc::channel(capacity);
        let epoch = {
            let mut state = self.state.write();
            if state.state != expected {
                debug!(
                    exchange = %self.exchange,
                    state = %state.state,
                    "Discarding socket opened after shutdown"
                );
                return None;
            }
            *self.send_tx.write() = Some(send_tx);
            state.mark_connected()
        };
        tracing::Span::current().record("epoch", epoch);
        self.notify(ConnectionState::Connected, epoch).await;
        Some((epoch, send_rx))
    }
}

/// The single streaming socket to one exchange.
///
/// Outbound subscription frames go through [`StreamSink::send`]; inbound
/// frames, acknowledgements and state transitions are reported to the
/// registered [`StreamObserver`] together with the connection epoch.
///
/// # Example
///
/// ```ignore
/// use relay_core::types::ExchangeId;
/// use relay_gateway::ws::{StreamConnection, TopicRouter, WebSocketConfig};
///
/// let config = WebSocketConfig::builder()
///     .url("wss://stream.bybit.com/v5/public/spot")
///     .exchange("bybit")
///     .build();
///
/// let connection = StreamConnection::new(config, TopicRouter::new(ExchangeId::bybit()));
/// connection.set_observer(&broker);
/// connection.connect().await?;
/// ```
pub struct StreamConnection {
    config: WebSocketConfig,
    router: TopicRouter,
    inner: Arc<Inner>,
}

impl StreamConnection {
    /// Creates a disconnected stream connection.
    #[must_use]
    pub fn new(config: WebSocketConfig, router: TopicRouter) -> Self {
        let inner = Arc::new(Inner {
            exchange: router.exchange().clone(),
            state: RwLock::new(InternalState::new()),
            send_tx: RwLock::new(None),
            shutdown_tx: Mutex::new(None),
            observer: RwLock::new(None),
            transition_lock: tokio::sync::Mutex::new(()),
        });
        Self {
            config,
            router,
            inner,
        }
    }

    /// Registers the observer that receives frames and state changes.
    ///
    /// Only a weak reference is kept; the observer usually owns this
    /// connection as its sink.
    pub fn set_observer(&self, observer: &Arc<dyn StreamObserver>) {
        *self.inner.observer.write() = Some(Arc::downgrade(observer));
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.read().state
    }

    /// Returns the current connection epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.state.read().epoch
    }

    /// Returns the number of reconnection attempts since the last open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.read().reconnect_attempts
    }

    /// Topic router used to format outbound topic strings.
    #[must_use]
    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    /// Connection settings.
    #[must_use]
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Opens the socket.
    ///
    /// Resolves once the handshake completes and the observer has seen the
    /// transition to Connected. A no-op while Connected or while a
    /// reconnect is in progress. A [`disconnect`](Self::disconnect) during
    /// the handshake abandons it and this resolves with `Ok(())`, leaving
    /// the connection Closed.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the URL is invalid, the handshake fails or
    /// it does not finish within the connect timeout.
    pub async fn connect(&self) -> Result<(), NetworkError> {
        let _guard = self.inner.transition_lock.lock().await;

        let current = self.state();
        if current.is_connected() || current.is_transitioning() {
            return Ok(());
        }

        validate_url(&self.config.url)?;

        // The sender is in place before the state reads Connecting, so a
        // disconnect() that observes Connecting can always cancel.
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        *self.inner.shutdown_tx.lock() = Some(shutdown_tx);
        let epoch = {
            let mut state = self.inner.state.write();
            state.mark_connecting();
            state.epoch
        };
        self.inner.notify(ConnectionState::Connecting, epoch).await;

        let opened = tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!(exchange = %self.inner.exchange, "Handshake cancelled by disconnect");
                return Ok(());
            }
            opened = open(&self.config) => opened,
        };
        if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
            debug!(exchange = %self.inner.exchange, "Handshake cancelled by disconnect");
            return Ok(());
        }

        let ws_stream = match opened {
            Ok(ws_stream) => ws_stream,
            Err(e) => {
                warn!(exchange = %self.inner.exchange, error = %e, "Stream connect failed");
                self.inner.state.write().mark_disconnected();
                self.inner
                    .notify(ConnectionState::Disconnected, epoch)
                    .await;
                return Err(e);
            }
        };

        let span = relay_telemetry::spans::stream_span(self.inner.exchange.as_str());
        let Some((epoch, send_rx)) = self
            .inner
            .on_open(self.config.send_queue_capacity, ConnectionState::Connecting)
            .instrument(span.clone())
            .await
        else {
            return Ok(());
        };

        info!(
            exchange = %self.inner.exchange,
            url = %self.config.url,
            epoch,
            "Stream connected"
        );

        tokio::spawn(
            supervise(
                Arc::clone(&self.inner),
                self.config.clone(),
                self.router.clone(),
                ws_stream,
                send_rx,
                epoch,
                shutdown_rx,
            )
            .instrument(span),
        );

        Ok(())
    }

    /// Closes the socket and stops any handshake or reconnect in progress.
    ///
    /// The connection ends up Closed whatever it was doing; a handshake
    /// that completes concurrently is discarded.
    pub async fn disconnect(&self) {
        self.inner.signal_shutdown();
        let _guard = self.inner.transition_lock.lock().await;
        // A connect() that finished before the lock was taken installed a
        // new sender.
        self.inner.signal_shutdown();

        let (previous, epoch) = {
            let mut state = self.inner.state.write();
            *self.inner.send_tx.write() = None;
            let previous = state.state;
            state.mark_closed();
            (previous, state.epoch)
        };

        if previous != ConnectionState::Closed {
            self.inner.notify(ConnectionState::Closed, epoch).await;
        }
    }
}

impl StreamSink for StreamConnection {
    fn exchange(&self) -> &ExchangeId {
        &self.inner.exchange
    }

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    fn epoch(&self) -> u64 {
        self.inner.state.read().epoch
    }

    fn send(&self, topic: &Topic, op: SubscriptionOp) -> Result<(), NetworkError> {
        let not_connected = || NetworkError::NotConnected {
            exchange: self.inner.exchange.to_string(),
        };

        if !self.is_connected() {
            debug!(exchange = %self.inner.exchange, topic = %topic, op = %op, "Dropping frame, stream not connected");
            return Err(not_connected());
        }

        let topic_string = self.router.format(topic);
        let text = OutboundFrame::subscription(op, topic_string.as_str()).encode()?;

        let guard = self.inner.send_tx.read();
        let send_tx = guard.as_ref().ok_or_else(not_connected)?;
        send_tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => NetworkError::WebSocket {
                reason: "Outbound queue full".to_string(),
            },
            TrySendError::Closed(_) => not_connected(),
        })?;

        debug!(exchange = %self.inner.exchange, topic = %topic_string, op = %op, "Queued subscription frame");
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<(), NetworkError> {
    let parsed = url::Url::parse(url).map_err(|e| NetworkError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(NetworkError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

async fn open(config: &WebSocketConfig) -> Result<WsStream, NetworkError> {
    let (ws_stream, _) = timeout(config.connect_timeout(), connect_async(config.url.as_str()))
        .await
        .map_err(|_| NetworkError::Timeout {
            timeout_ms: config.connect_timeout_ms,
        })?
        .map_err(|e| NetworkError::ConnectionFailed {
            reason: e.to_string(),
        })?;
    Ok(ws_stream)
}

/// Runs sessions back to back, reconnecting after transport failures until
/// shut down or out of attempts.
async fn supervise(
    inner: Arc<Inner>,
    config: WebSocketConfig,
    router: TopicRouter,
    mut ws_stream: WsStream,
    mut send_rx: mpsc::Receiver<String>,
    mut epoch: u64,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        let reason = match run_session(&inner, &config, &router, ws_stream, send_rx, epoch, &mut shutdown_rx)
            .await
        {
            SessionEnd::Shutdown => {
                debug!(exchange = %inner.exchange, "Stream session shut down");
                return;
            }
            SessionEnd::Failed(reason) => reason,
        };

        *inner.send_tx.write() = None;
        warn!(exchange = %inner.exchange, epoch, reason = %reason, "Stream session ended");

        let mut attempt = 0u32;
        ws_stream = loop {
            let transition = inner.transition_lock.lock().await;
            if inner.state.read().state == ConnectionState::Closed {
                return;
            }

            if !config.should_reconnect(attempt) {
                let epoch = {
                    let mut state = inner.state.write();
                    state.mark_closed();
                    state.epoch
                };
                warn!(exchange = %inner.exchange, attempts = attempt, "Reconnect attempts exhausted");
                inner.notify(ConnectionState::Closed, epoch).await;
                return;
            }

            let current_epoch = {
                let mut state = inner.state.write();
                state.mark_reconnecting();
                state.epoch
            };
            inner
                .notify(ConnectionState::Reconnecting, current_epoch)
                .await;
            drop(transition);

            let delay = config.calculate_reconnect_delay(attempt);
            info!(
                exchange = %inner.exchange,
                attempt = attempt + 1,
                max_attempts = config.max_reconnect_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting"
            );

            tokio::select! {
                _ = shutdown_rx.recv() => return,
                () = tokio::time::sleep(delay) => {}
            }

            let opened = tokio::select! {
                _ = shutdown_rx.recv() => return,
                opened = open(&config) => opened,
            };

            match opened {
                Ok(ws_stream) => break ws_stream,
                Err(e) => {
                    warn!(exchange = %inner.exchange, error = %e, "Reconnect failed");
                    attempt += 1;
                }
            }
        };

        let opened = {
            let _guard = inner.transition_lock.lock().await;
            // disconnect() may have raced the handshake.
            if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                return;
            }
            inner
                .on_open(config.send_queue_capacity, ConnectionState::Reconnecting)
                .await
        };
        let Some(opened) = opened else {
            return;
        };
        (epoch, send_rx) = opened;
    }
}

async fn run_session(
    inner: &Inner,
    config: &WebSocketConfig,
    router: &TopicRouter,
    ws_stream: WsStream,
    mut send_rx: mpsc::Receiver<String>,
    epoch: u64,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> SessionEnd {
    let (mut sink, mut stream): (WsSink, WsSource) = ws_stream.split();

    let period = config.heartbeat_interval();
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("Shutdown signal received");
                let _ = sink.close().await;
                return SessionEnd::Shutdown;
            }

            Some(text) = send_rx.recv() => {
                trace!(frame = %text, "Sending frame");
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    return SessionEnd::Failed(format!("send failed: {e}"));
                }
            }

            message = stream.next() => {
                match message {
                    Some(Ok(message)) => {
                        if let Some(end) = handle_message(inner, router, &mut sink, message, epoch).await {
                            return end;
                        }
                    }
                    Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                    None => return SessionEnd::Failed("stream ended".to_string()),
                }
            }

            _ = heartbeat.tick() => {
                if inner.state.read().pong_overdue(config.pong_timeout()) {
                    return SessionEnd::Failed("pong timeout".to_string());
                }
                let ping = match OutboundFrame::ping().encode() {
                    Ok(ping) => ping,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode ping");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(ping.into())).await {
                    return SessionEnd::Failed(format!("ping failed: {e}"));
                }
                inner.state.write().record_ping();
                trace!("Ping sent");
            }
        }
    }
}

async fn handle_message(
    inner: &Inner,
    router: &TopicRouter,
    sink: &mut WsSink,
    message: Message,
    epoch: u64,
) -> Option<SessionEnd> {
    inner.state.write().record_message();

    match message {
        Message::Text(text) => handle_text(inner, router, text.as_str(), epoch).await,
        Message::Binary(data) => match std::str::from_utf8(&data) {
            Ok(text) => handle_text(inner, router, text, epoch).await,
            Err(e) => warn!(error = %e, "Dropping non UTF-8 binary frame"),
        },
        Message::Ping(data) => {
            if let Err(e) = sink.send(Message::Pong(data)).await {
                return Some(SessionEnd::Failed(format!("pong failed: {e}")));
            }
        }
        Message::Pong(_) => {
            inner.state.write().record_pong();
        }
        Message::Close(frame) => {
            info!(frame = ?frame, "Server sent close frame");
            return Some(SessionEnd::Failed("server closed connection".to_string()));
        }
        Message::Frame(_) => {}
    }

    None
}

async fn handle_text(inner: &Inner, router: &TopicRouter, text: &str, epoch: u64) {
    let frame = match InboundFrame::decode(text) {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            debug!(frame = %text, "Ignoring unrecognised frame");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Dropping unparseable frame");
            return;
        }
    };

    match frame {
        InboundFrame::Pong => {
            inner.state.write().record_pong();
            trace!("Pong received");
        }
        InboundFrame::Data {
            topic,
            update_type,
            ts,
            data,
        } => {
            let Some(parsed) = router.parse(&topic) else {
                debug!(topic = %topic, "Dropping frame for unknown topic");
                return;
            };
            if let Some(observer) = inner.observer() {
                observer
                    .on_data(epoch, parsed, RawFrame { update_type, ts, data })
                    .await;
            }
        }
        InboundFrame::Ack(ack) => {
            if ack.success {
                debug!(op = ?ack.op, "Request acknowledged");
            } else {
                warn!(op = ?ack.op, message = %ack.message, "Request rejected");
            }
            if let Some(observer) = inner.observer() {
                observer.on_ack(epoch, ack).await;
            }
        }
        InboundFrame::Error(message) => {
            warn!(message = %message, "Subscription request failed to apply");
            if let Some(observer) = inner.observer() {
                observer
                    .on_protocol_error(
                        epoch,
                        format!("subscription request failed to apply: {message}"),
                    )
                    .await;
            }
        }
    }
}
