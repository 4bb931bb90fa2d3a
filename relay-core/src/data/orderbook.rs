//! Order book data structures.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::Symbol;

/// A single price level, serialized as `[price, size]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct PriceLevel {
    /// Price of the level.
    pub price: f64,
    /// Resting size; `0` inside a delta means "remove this level".
    pub size: f64,
}

impl PriceLevel {
    /// Creates a new price level.
    #[must_use]
    pub const fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

impl From<(f64, f64)> for PriceLevel {
    fn from((price, size): (f64, f64)) -> Self {
        Self { price, size }
    }
}

impl From<PriceLevel> for (f64, f64) {
    fn from(level: PriceLevel) -> Self {
        (level.price, level.size)
    }
}

/// Whether an order-book update replaces the book or patches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookUpdateKind {
    /// Full book.
    #[default]
    Snapshot,
    /// Changed levels only.
    Delta,
}

/// Order book update.
///
/// Construction through [`OrderBook::new`] sorts bids by price descending
/// and asks by price ascending.
///
/// ```
/// use relay_core::data::{BookUpdateKind, OrderBook, PriceLevel};
/// use relay_core::types::Symbol;
///
/// let book = OrderBook::new(
///     Symbol::new("ETHUSDT").unwrap(),
///     vec![PriceLevel::new(1999.0, 1.0), PriceLevel::new(2000.0, 2.0)],
///     vec![PriceLevel::new(2002.0, 1.0), PriceLevel::new(2001.0, 3.0)],
///     BookUpdateKind::Snapshot,
/// );
/// assert_eq!(book.best_bid().unwrap().price, 2000.0);
/// assert_eq!(book.best_ask().unwrap().price, 2001.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Instrument.
    pub symbol: Symbol,
    /// Bid levels, highest price first.
    pub bids: Vec<PriceLevel>,
    /// Ask levels, lowest price first.
    pub asks: Vec<PriceLevel>,
    /// Snapshot or delta.
    pub kind: BookUpdateKind,
    /// Exchange update id; consecutive deltas increase it.
    #[serde(default)]
    pub update_id: u64,
    /// Exchange timestamp (ms).
    #[serde(default)]
    pub time: i64,
}

impl OrderBook {
    /// Creates an order book, sorting both sides.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
        kind: BookUpdateKind,
    ) -> Self {
        bids.sort_by(|a, b| descending(a.price, b.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        Self {
            symbol,
            bids,
            asks,
            kind,
            update_id: 0,
            time: 0,
        }
    }

    /// Sets the exchange update id.
    #[must_use]
    pub fn with_update_id(mut self, update_id: u64) -> Self {
        self.update_id = update_id;
        self
    }

    /// Sets the exchange timestamp.
    #[must_use]
    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Returns the best bid (highest bid price).
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Returns the best ask (lowest ask price).
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Returns the spread (best ask - best bid).
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Returns the mid price.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    /// Returns true if both sides are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
