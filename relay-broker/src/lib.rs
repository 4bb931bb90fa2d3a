//! # Relay Broker
//!
//! Subscription management between exchange stream connections and the
//! internal consumers of market data.
//!
//! This crate provides:
//! - [`SubscriptionBroker`] - reference-counted topic subscriptions with
//!   fan-out, stale-epoch filtering and replay after reconnect
//! - [`ChannelConsumer`] - an event handler backed by a tokio channel
//! - [`ExchangeRegistry`] - the owned set of exchange adapters
//!
//! # Example
//!
//! ```ignore
//! use relay_broker::{ChannelConsumer, ExchangeRegistry};
//!
//! let registry = ExchangeRegistry::new();
//! registry.register(Arc::new(BybitExchange::new(config)?));
//! registry.connect(&ExchangeId::bybit(), None).await?;
//!
//! let (consumer, mut rx) = ChannelConsumer::channel(1024);
//! let exchange = registry.get(&ExchangeId::bybit()).unwrap();
//! let handle = exchange.subscribe_trades(&Symbol::new("BTCUSDT")?, consumer)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Reference-counted subscription broker
pub mod broker;

/// Channel-backed consumers
pub mod consumer;

/// Exchange registry
pub mod registry;

pub use broker::SubscriptionBroker;
pub use consumer::{ChannelConsumer, ConsumerMessage};
pub use registry::ExchangeRegistry;
