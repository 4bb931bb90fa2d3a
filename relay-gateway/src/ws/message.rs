//! Stream frame types and codec.
//!
//! Outbound frames are `{"op": ..., "args": [...]}`. Inbound text is one of
//! a data frame (`topic` + `data`), a request acknowledgement (`success`),
//! an error report (`error`) or a pong.

use relay_core::error::{DataError, NetworkError};
use relay_core::traits::{SubscriptionAck, SubscriptionOp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A frame sent to the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundFrame {
    /// Operation name.
    pub op: String,
    /// Operation arguments (topic strings).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl OutboundFrame {
    /// Subscribe/unsubscribe request for one topic string.
    #[must_use]
    pub fn subscription(op: SubscriptionOp, topic: impl Into<String>) -> Self {
        Self {
            op: op.as_str().to_string(),
            args: vec![topic.into()],
        }
    }

    /// Application-level ping.
    #[must_use]
    pub fn ping() -> Self {
        Self {
            op: "ping".to_string(),
            args: Vec::new(),
        }
    }

    /// Serializes the frame to its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if serialization fails.
    pub fn encode(&self) -> Result<String, NetworkError> {
        serde_json::to_string(self).map_err(|e| NetworkError::WebSocket {
            reason: format!("Failed to serialize frame: {e}"),
        })
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Market data for a topic string.
    Data {
        /// Raw topic string.
        topic: String,
        /// `snapshot` / `delta`, when present.
        update_type: Option<String>,
        /// Exchange timestamp (ms), `0` when absent.
        ts: i64,
        /// The `data` member.
        data: Value,
    },
    /// Acknowledgement of a subscribe/unsubscribe request.
    Ack(SubscriptionAck),
    /// Reply to an application ping.
    Pong,
    /// Error reported by the exchange.
    Error(String),
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default, rename = "type")]
    update_type: Option<String>,
    #[serde(default)]
    ts: Option<i64>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    ret_msg: Option<String>,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl InboundFrame {
    /// Decodes one text frame.
    ///
    /// Returns `Ok(None)` for well-formed JSON that matches none of the
    /// known shapes.
    ///
    /// # Errors
    ///
    /// Returns `DataError::JsonError` if the text is not a JSON object.
    pub fn decode(text: &str) -> Result<Option<Self>, DataError> {
        let wire: WireFrame = serde_json::from_str(text)?;

        if wire.op.as_deref() == Some("pong") || wire.ret_msg.as_deref() == Some("pong") {
            return Ok(Some(Self::Pong));
        }

        if let (Some(topic), Some(data)) = (wire.topic, wire.data) {
            return Ok(Some(Self::Data {
                topic,
                update_type: wire.update_type,
                ts: wire.ts.unwrap_or_default(),
                data,
            }));
        }

        if let Some(error) = wire.error {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Ok(Some(Self::Error(message)));
        }

        if let Some(success) = wire.success {
            return Ok(Some(Self::Ack(SubscriptionAck {
                success,
                op: wire.op.as_deref().and_then(SubscriptionOp::parse),
                message: wire.ret_msg.unwrap_or_default(),
            })));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_frame_text() {
        let frame = OutboundFrame::subscription(SubscriptionOp::Subscribe, "publicTrade.BTCUSDT");
        let value: Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"op": "subscribe", "args": ["publicTrade.BTCUSDT"]}));
    }

    #[test]
    fn test_ping_frame_has_no_args() {
        assert_eq!(OutboundFrame::ping().encode().unwrap(), r#"{"op":"ping"}"#);
    }

    #[test]
    fn test_decode_data_frame() {
        let text = r#"{"topic":"orderbook.200.BTCUSDT","type":"snapshot","ts":1672304484978,"data":{"s":"BTCUSDT"}}"#;
        let frame = InboundFrame::decode(text).unwrap().unwrap();
        match frame {
            InboundFrame::Data {
                topic,
                update_type,
                ts,
                data,
            } => {
                assert_eq!(topic, "orderbook.200.BTCUSDT");
                assert_eq!(update_type.as_deref(), Some("snapshot"));
                assert_eq!(ts, 1_672_304_484_978);
                assert_eq!(data["s"], "BTCUSDT");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ack() {
        let text = r#"{"success":true,"ret_msg":"","conn_id":"abc","op":"subscribe"}"#;
        let frame = InboundFrame::decode(text).unwrap().unwrap();
        assert_eq!(
            frame,
            InboundFrame::Ack(SubscriptionAck {
                success: true,
                op: Some(SubscriptionOp::Subscribe),
                message: String::new(),
            })
        );
    }

    #[test]
    fn test_decode_rejected_ack() {
        let text = r#"{"success":false,"ret_msg":"error:handler not found","op":"subscribe"}"#;
        let Some(InboundFrame::Ack(ack)) = InboundFrame::decode(text).unwrap() else {
            panic!("expected ack");
        };
        assert!(!ack.success);
        assert_eq!(ack.message, "error:handler not found");
    }

    #[test]
    fn test_decode_pong() {
        let text = r#"{"success":true,"ret_msg":"pong","conn_id":"abc","op":"ping"}"#;
        assert_eq!(InboundFrame::decode(text).unwrap(), Some(InboundFrame::Pong));
        assert_eq!(
            InboundFrame::decode(r#"{"op":"pong"}"#).unwrap(),
            Some(InboundFrame::Pong)
        );
    }

    #[test]
    fn test_decode_error_frame() {
        let frame = InboundFrame::decode(r#"{"error":"bad request"}"#).unwrap();
        assert_eq!(frame, Some(InboundFrame::Error("bad request".to_string())));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(InboundFrame::decode("not json").is_err());
        assert_eq!(InboundFrame::decode(r#"{"hello":1}"#).unwrap(), None);
    }
}
