//! Seams between the stream connection and the subscription broker.
//!
//! The broker talks to the socket through [`StreamSink`]; the socket reports
//! back through [`StreamObserver`]. Neither side knows the other's concrete
//! type, which keeps the broker testable without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NetworkError;
use crate::types::{Channel, ConnectionState, ExchangeId, Topic};

/// Upstream subscription operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionOp {
    /// Start receiving a topic.
    Subscribe,
    /// Stop receiving a topic.
    Unsubscribe,
}

impl SubscriptionOp {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }

    /// Parses the wire spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a data frame, before normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFrame {
    /// Update type reported by the exchange (`snapshot`, `delta`), if any.
    #[serde(default)]
    pub update_type: Option<String>,
    /// Exchange timestamp of the frame (ms), `0` if absent.
    #[serde(default)]
    pub ts: i64,
    /// The `data` member of the frame.
    pub data: serde_json::Value,
}

impl RawFrame {
    /// Frame with only a `data` member.
    #[must_use]
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            update_type: None,
            ts: 0,
            data,
        }
    }
}

/// Acknowledgement of a subscribe/unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionAck {
    /// Whether the exchange applied the request.
    pub success: bool,
    /// Operation being acknowledged, when the exchange echoes it.
    pub op: Option<SubscriptionOp>,
    /// Exchange message (empty on success).
    pub message: String,
}

/// Outbound side of a stream connection, as the broker sees it.
pub trait StreamSink: Send + Sync {
    /// Exchange this sink talks to.
    fn exchange(&self) -> &ExchangeId;

    /// Returns true while the socket is open.
    fn is_connected(&self) -> bool;

    /// Serializes and enqueues a subscription frame for `topic`.
    ///
    /// Fails with [`NetworkError::NotConnected`] when the socket is not open;
    /// the frame is dropped, not queued.
    fn send(&self, topic: &Topic, op: SubscriptionOp) -> Result<(), NetworkError>;

    /// Epoch of the socket that [`send`](Self::send) currently writes to.
    ///
    /// Sinks that never reconnect report `0`.
    fn epoch(&self) -> u64 {
        0
    }

    /// Whether the exchange supports targeted unsubscribe on `channel`.
    fn supports_unsubscribe(&self, channel: Channel) -> bool {
        let _ = channel;
        true
    }
}

/// Inbound side of a stream connection.
///
/// Every callback carries the connection epoch of the socket that produced
/// it so observers can discard frames from a socket that has since been
/// replaced.
#[async_trait]
pub trait StreamObserver: Send + Sync {
    /// A data frame for `topic` arrived.
    async fn on_data(&self, epoch: u64, topic: Topic, raw: RawFrame);

    /// A subscribe/unsubscribe acknowledgement arrived.
    async fn on_ack(&self, epoch: u64, ack: SubscriptionAck);

    /// The exchange reported a protocol-level error.
    async fn on_protocol_error(&self, epoch: u64, message: String);

    /// The connection changed state. `epoch` is incremented on every
    /// transition into [`ConnectionState::Connected`].
    async fn on_state_change(&self, state: ConnectionState, epoch: u64);
}
