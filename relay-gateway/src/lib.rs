//! # Relay Gateway
//!
//! Network side of the relay exchange connectivity layer.
//!
//! This crate provides:
//! - Stream connection with automatic reconnection, heartbeat and connection epochs
//! - Topic router between structured topics and wire topic strings
//! - REST gateway with rate limiting, response caching and request signing
//! - Exchange adapters (Bybit)
//!
//! # Architecture
//!
//! - `ws` - Stream connection infrastructure
//! - `rest` - REST gateway infrastructure
//! - Exchange-specific modules (bybit)
//!
//! # Example
//!
//! ```ignore
//! use relay_broker::{ChannelConsumer, ExchangeRegistry};
//! use relay_gateway::bybit::BybitExchange;
//!
//! let registry = ExchangeRegistry::new();
//! registry.register(Arc::new(BybitExchange::new(&config.exchange("bybit"))?));
//! registry.connect(&ExchangeId::bybit(), None).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Stream connection infrastructure
pub mod ws;

/// REST gateway infrastructure
pub mod rest;

/// Bybit exchange adapter
#[cfg(feature = "bybit")]
pub mod bybit;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::rest::{Auth, RestConfig, RestConfigBuilder, RestGateway};
    pub use crate::ws::{StreamConnection, TopicRouter, WebSocketConfig, WebSocketConfigBuilder};

    #[cfg(feature = "bybit")]
    pub use crate::bybit::{BybitExchange, BybitNormalizer};
}
