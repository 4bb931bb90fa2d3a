//! Bybit v5 exchange adapter.
//!
//! This module provides:
//! - BybitExchange - `Exchange` implementation over the public spot stream
//!   and the v5 REST API
//! - BybitNormalizer - Stream payload normalizer
//! - REST result parsers for wallet balance, open orders and klines
//!
//! # Example
//!
//! ```ignore
//! use relay_core::config::ExchangeConfig;
//! use relay_core::traits::{Exchange, handler_fn};
//! use relay_gateway::bybit::BybitExchange;
//!
//! let bybit = BybitExchange::new(&ExchangeConfig::default())?;
//! bybit.connect(None).await?;
//!
//! let handle = bybit.subscribe_candles(&symbol, Interval::Minute1, handler_fn(|_, event| {
//!     tracing::info!(?event, "candle");
//!     Ok(())
//! }))?;
//! ```

mod exchange;
mod normalizer;
mod types;

pub use exchange::BybitExchange;
pub use normalizer::{BybitNormalizer, parse_account, parse_klines, parse_open_orders};
pub use types::*;
