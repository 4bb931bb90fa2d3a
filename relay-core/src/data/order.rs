//! Open order records.

use serde::{Deserialize, Serialize};

use super::Side;
use crate::types::Symbol;

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Limit order.
    Limit,
    /// Market order.
    Market,
    /// Anything else the exchange reports.
    #[default]
    Unknown,
}

impl OrderType {
    /// Parses the exchange spelling, case-insensitive.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("limit") {
            Self::Limit
        } else if value.eq_ignore_ascii_case("market") {
            Self::Market
        } else {
            Self::Unknown
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted and resting.
    New,
    /// Partially filled and still resting.
    PartiallyFilled,
    /// Conditional order waiting for its trigger.
    Untriggered,
    /// Completely filled.
    Filled,
    /// Cancelled.
    Cancelled,
    /// Rejected by the exchange.
    Rejected,
    /// Status string not recognized.
    #[default]
    Unknown,
}

impl OrderStatus {
    /// Parses the exchange spelling.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "New" | "Created" => Self::New,
            "PartiallyFilled" => Self::PartiallyFilled,
            "Untriggered" | "Triggered" => Self::Untriggered,
            "Filled" => Self::Filled,
            "Cancelled" | "PartiallyFilledCanceled" | "Deactivated" => Self::Cancelled,
            "Rejected" => Self::Rejected,
            _ => Self::Unknown,
        }
    }

    /// Returns true if the order is active (can still be filled or canceled).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::PartiallyFilled | Self::Untriggered)
    }

    /// Returns true if the order is in a final state.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

/// An order as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange order id.
    pub order_id: String,
    /// Client-assigned id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// Instrument.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: Side,
    /// Limit, market, ...
    pub order_type: OrderType,
    /// Limit price (0 for market orders).
    pub price: f64,
    /// Order quantity.
    pub quantity: f64,
    /// Quantity filled so far.
    pub filled_quantity: f64,
    /// Current status.
    pub status: OrderStatus,
    /// Creation time (ms).
    pub created_time: i64,
    /// Last update time (ms).
    pub updated_time: i64,
}

impl Order {
    /// Quantity still open.
    #[must_use]
    pub fn remaining_quantity(&self) -> f64 {
        (self.quantity - self.filled_quantity).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("New"), OrderStatus::New);
        assert_eq!(
            OrderStatus::parse("PartiallyFilledCanceled"),
            OrderStatus::Cancelled
        );
        assert_eq!(OrderStatus::parse("???"), OrderStatus::Unknown);
        assert!(OrderStatus::PartiallyFilled.is_active());
        assert!(OrderStatus::Filled.is_final());
    }

    #[test]
    fn test_remaining_quantity() {
        let order = Order {
            order_id: "1".to_string(),
            client_order_id: None,
            symbol: Symbol::new("BTCUSDT").unwrap(),
            side: Side::Buy,
            order_type: OrderType::parse("Limit"),
            price: 30000.0,
            quantity: 0.5,
            filled_quantity: 0.2,
            status: OrderStatus::PartiallyFilled,
            created_time: 1,
            updated_time: 2,
        };
        assert!((order.remaining_quantity() - 0.3).abs() < 1e-12);
        assert_eq!(order.order_type, OrderType::Limit);
    }
}
