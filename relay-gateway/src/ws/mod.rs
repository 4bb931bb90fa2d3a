//! Exchange stream infrastructure.
//!
//! This module provides:
//! - A stream connection with automatic reconnection and an application heartbeat
//! - The topic router mapping structured topics to wire topic strings
//! - Frame encoding and decoding
//! - Connection state tracking with per-connection epochs

mod client;
mod config;
mod message;
mod router;
mod state;

pub use client::StreamConnection;
pub use config::{WebSocketConfig, WebSocketConfigBuilder};
pub use message::{InboundFrame, OutboundFrame};
pub use router::{DEFAULT_ORDERBOOK_DEPTH, TopicRouter};
