//! Canonical market and account records.
//!
//! Exchange-native payloads are normalized into these shapes at the
//! boundary. Every numeric field is an `f64` parsed from the exchange's
//! string encoding; a field that is missing or unparseable becomes `0.0`,
//! never `NaN`. Timestamps are Unix milliseconds.
//!
//! # Structures
//!
//! - Trade - A public trade print
//! - Candle - OHLCV candlestick
//! - OrderBook - Bid/ask levels, bids descending and asks ascending
//! - Account / Balance - Wallet balances
//! - Order - An open order

mod account;
mod candle;
mod order;
mod orderbook;
mod trade;

pub use account::{Account, Balance};
pub use candle::Candle;
pub use order::{Order, OrderStatus, OrderType};
pub use orderbook::{BookUpdateKind, OrderBook, PriceLevel};
pub use trade::{Side, Trade};

/// Parses a decimal string into `f64`, mapping missing, empty and
/// non-finite input to `0.0`.
///
/// ```
/// use relay_core::data::parse_f64;
///
/// assert_eq!(parse_f64(Some("50000")), 50000.0);
/// assert_eq!(parse_f64(Some("")), 0.0);
/// assert_eq!(parse_f64(Some("NaN")), 0.0);
/// assert_eq!(parse_f64(None), 0.0);
/// ```
#[must_use]
pub fn parse_f64(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Reads a JSON value that may be a number or a numeric string as `f64`,
/// with the same defaulting rules as [`parse_f64`].
#[must_use]
pub fn json_f64(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => parse_f64(Some(s)),
        _ => 0.0,
    }
}

/// Reads a JSON value that may be an integer or an integer string as `i64`,
/// defaulting to `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn json_i64(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_f64_accepts_numbers_and_strings() {
        assert_eq!(json_f64(Some(&json!("0.1"))), 0.1);
        assert_eq!(json_f64(Some(&json!(2.5))), 2.5);
        assert_eq!(json_f64(Some(&json!(null))), 0.0);
        assert_eq!(json_f64(Some(&json!("abc"))), 0.0);
        assert_eq!(json_f64(None), 0.0);
    }

    #[test]
    fn test_json_i64() {
        assert_eq!(json_i64(Some(&json!(1_234_567_890))), 1_234_567_890);
        assert_eq!(json_i64(Some(&json!("1700000000000"))), 1_700_000_000_000);
        assert_eq!(json_i64(Some(&json!({}))), 0);
    }
}
