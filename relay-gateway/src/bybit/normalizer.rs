//! Bybit payload normalization.
//!
//! Converts stream frames and REST results into the canonical records of
//! `relay_core::data`.

use relay_core::data::{
    Account, Balance, BookUpdateKind, Candle, OrderBook, Order, OrderStatus, OrderType,
    PriceLevel, Side, Trade, json_f64, json_i64, parse_f64,
};
use relay_core::error::DataError;
use relay_core::events::MarketEvent;
use relay_core::traits::{Normalizer, RawFrame};
use relay_core::types::{Channel, Interval, Symbol, Topic};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::types::{
    BybitKline, BybitList, BybitOrder, BybitOrderBook, BybitTrade, BybitWalletAccount,
};

/// Normalizer for Bybit v5 public spot streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct BybitNormalizer;

impl BybitNormalizer {
    /// Creates a normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn trades(topic: &Topic, raw: &RawFrame) -> Result<Vec<MarketEvent>, DataError> {
        let records = records::<BybitTrade>(topic, &raw.data)?;
        Ok(records
            .into_iter()
            .map(|record| {
                MarketEvent::Trade(Trade {
                    id: id_string(&record.id),
                    symbol: topic.symbol().clone(),
                    price: json_f64(Some(&record.price)),
                    quantity: json_f64(Some(&record.size)),
                    side: record.side.as_deref().map_or(Side::Unknown, Side::parse),
                    time: json_i64(Some(&record.time)),
                })
            })
            .collect())
    }

    fn candles(topic: &Topic, raw: &RawFrame) -> Result<Vec<MarketEvent>, DataError> {
        let records = records::<BybitKline>(topic, &raw.data)?;
        Ok(records
            .into_iter()
            .map(|k| {
                MarketEvent::Candle(Candle {
                    time: json_i64(Some(&k.start)),
                    open: json_f64(Some(&k.open)),
                    high: json_f64(Some(&k.high)),
                    low: json_f64(Some(&k.low)),
                    close: json_f64(Some(&k.close)),
                    volume: json_f64(Some(&k.volume)),
                    turnover: json_f64(Some(&k.turnover)),
                    confirmed: k.confirm,
                })
            })
            .collect())
    }

    fn orderbook(topic: &Topic, raw: &RawFrame) -> Result<Vec<MarketEvent>, DataError> {
        if !raw.data.is_object() {
            return Err(unexpected(topic, "expected an order book object"));
        }
        let book = BybitOrderBook::deserialize(&raw.data)?;
        let kind = match raw.update_type.as_deref() {
            Some("delta") => BookUpdateKind::Delta,
            _ => BookUpdateKind::Snapshot,
        };

        let book = OrderBook::new(
            topic.symbol().clone(),
            levels(&book.b),
            levels(&book.a),
            kind,
        )
        .with_update_id(book.u)
        .with_time(raw.ts);

        Ok(vec![MarketEvent::OrderBook(book)])
    }
}

impl Normalizer for BybitNormalizer {
    fn normalize(&self, topic: &Topic, raw: &RawFrame) -> Result<Vec<MarketEvent>, DataError> {
        match topic.channel() {
            Channel::Trades => Self::trades(topic, raw),
            Channel::Candles => Self::candles(topic, raw),
            Channel::OrderBook => Self::orderbook(topic, raw),
        }
    }
}

/// Parses the `/v5/account/wallet-balance` response into an [`Account`].
///
/// # Errors
///
/// Returns `DataError` if the envelope has no `result` or the account list
/// is empty.
pub fn parse_account(payload: &Value) -> Result<Account, DataError> {
    let result = result(payload)?;
    let accounts = BybitList::<BybitWalletAccount>::deserialize(result)?;
    let account = accounts
        .list
        .into_iter()
        .next()
        .ok_or_else(|| DataError::MissingData {
            description: "wallet balance list is empty".to_string(),
        })?;

    Ok(Account {
        account_type: account.account_type,
        total_equity: parse_f64(Some(&account.total_equity)),
        total_wallet_balance: parse_f64(Some(&account.total_wallet_balance)),
        total_available_balance: parse_f64(Some(&account.total_available_balance)),
        balances: account
            .coin
            .into_iter()
            .map(|c| {
                let available = if c.available_to_withdraw.is_empty() {
                    &c.free
                } else {
                    &c.available_to_withdraw
                };
                Balance {
                    equity: parse_f64(Some(&c.equity)),
                    wallet_balance: parse_f64(Some(&c.wallet_balance)),
                    available: parse_f64(Some(available)),
                    coin: c.coin,
                }
            })
            .collect(),
    })
}

/// Parses the `/v5/order/realtime` response.
///
/// Orders whose symbol cannot be parsed are attributed to `requested`.
///
/// # Errors
///
/// Returns `DataError` if the envelope has no `result` or the list is
/// malformed.
pub fn parse_open_orders(payload: &Value, requested: &Symbol) -> Result<Vec<Order>, DataError> {
    let result = result(payload)?;
    let orders = BybitList::<BybitOrder>::deserialize(result)?;

    Ok(orders
        .list
        .into_iter()
        .map(|o| Order {
            symbol: Symbol::new(&o.symbol).unwrap_or_else(|_| requested.clone()),
            client_order_id: (!o.order_link_id.is_empty()).then_some(o.order_link_id),
            side: Side::parse(&o.side),
            order_type: OrderType::parse(&o.order_type),
            price: parse_f64(Some(&o.price)),
            quantity: parse_f64(Some(&o.qty)),
            filled_quantity: parse_f64(Some(&o.cum_exec_qty)),
            status: OrderStatus::parse(&o.order_status),
            created_time: o.created_time.parse().unwrap_or(0),
            updated_time: o.updated_time.parse().unwrap_or(0),
            order_id: o.order_id,
        })
        .collect())
}

/// Parses the `/v5/market/kline` response, oldest candle first.
///
/// Rows are `[start, open, high, low, close, volume, turnover]`. REST rows
/// carry no confirm flag, so a candle counts as confirmed once its interval
/// has elapsed at `now_ms`.
///
/// # Errors
///
/// Returns `DataError` if the envelope has no `result` or the list is
/// malformed.
pub fn parse_klines(
    payload: &Value,
    interval: Interval,
    now_ms: i64,
) -> Result<Vec<Candle>, DataError> {
    let result = result(payload)?;
    let rows = BybitList::<Vec<Value>>::deserialize(result)?;
    let span_ms = i64::try_from(interval.duration().as_millis()).unwrap_or(i64::MAX);

    let mut candles: Vec<Candle> = rows
        .list
        .iter()
        .map(|row| {
            let time = json_i64(row.first());
            Candle {
                time,
                open: json_f64(row.get(1)),
                high: json_f64(row.get(2)),
                low: json_f64(row.get(3)),
                close: json_f64(row.get(4)),
                volume: json_f64(row.get(5)),
                turnover: json_f64(row.get(6)),
                confirmed: time.saturating_add(span_ms) <= now_ms,
            }
        })
        .collect();
    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

fn result(payload: &Value) -> Result<&Value, DataError> {
    payload.get("result").ok_or_else(|| DataError::MissingData {
        description: "response has no result member".to_string(),
    })
}

/// Deserializes `data` as a list of records; a lone object counts as a
/// one-element list.
fn records<T>(topic: &Topic, data: &Value) -> Result<Vec<T>, DataError>
where
    T: for<'de> Deserialize<'de>,
{
    match data {
        Value::Array(_) => Ok(Vec::<T>::deserialize(data)?),
        Value::Object(_) => Ok(vec![T::deserialize(data)?]),
        _ => Err(unexpected(topic, "expected an array of records")),
    }
}

fn levels(raw: &[Vec<Value>]) -> Vec<PriceLevel> {
    raw.iter()
        .filter_map(|level| {
            if level.len() < 2 {
                warn!(?level, "Skipping malformed price level");
                return None;
            }
            Some(PriceLevel::new(json_f64(level.first()), json_f64(level.get(1))))
        })
        .collect()
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn unexpected(topic: &Topic, reason: &str) -> DataError {
    DataError::UnexpectedPayload {
        topic: topic.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::ExchangeId;
    use serde_json::json;

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn normalize(topic: &Topic, raw: RawFrame) -> Vec<MarketEvent> {
        BybitNormalizer::new().normalize(topic, &raw).unwrap()
    }

    #[test]
    fn test_long_form_trade() {
        let topic = Topic::trades(ExchangeId::bybit(), symbol("BTCUSDT"));
        let raw = RawFrame::new(json!([
            {"price": "50000", "size": "0.1", "side": "Buy", "timestamp": 1_234_567_890}
        ]));

        let events = normalize(&topic, raw);
        assert_eq!(events.len(), 1);
        let trade = events[0].as_trade().unwrap();
        assert_eq!(trade.price, 50000.0);
        assert_eq!(trade.quantity, 0.1);
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.time, 1_234_567_890);
        assert_eq!(trade.symbol, symbol("BTCUSDT"));
    }

    #[test]
    fn test_wire_trades() {
        let topic = Topic::trades(ExchangeId::bybit(), symbol("BTCUSDT"));
        let raw = RawFrame::new(json!([
            {"i": "2290000000032018802", "T": 1_672_304_486_865_i64, "p": "16578.50", "v": "0.006", "S": "Sell", "s": "BTCUSDT", "BT": false},
            {"i": 7, "T": "1672304486866", "p": "oops", "S": "Hold"}
        ]));

        let events = normalize(&topic, raw);
        let first = events[0].as_trade().unwrap();
        assert_eq!(first.id, "2290000000032018802");
        assert_eq!(first.price, 16578.5);
        assert_eq!(first.side, Side::Sell);
        assert_eq!(first.time, 1_672_304_486_865);

        let second = events[1].as_trade().unwrap();
        assert_eq!(second.id, "7");
        assert_eq!(second.price, 0.0);
        assert_eq!(second.quantity, 0.0);
        assert_eq!(second.side, Side::Unknown);
        assert_eq!(second.time, 1_672_304_486_866);
    }

    #[test]
    fn test_candles() {
        let topic = Topic::candles(ExchangeId::bybit(), symbol("BTCUSDT"), Interval::Minute5);
        let raw = RawFrame::new(json!([{
            "start": 1_672_324_800_000_i64, "end": 1_672_325_099_999_i64, "interval": "5",
            "open": "16649.5", "close": "16677", "high": "16677", "low": "16608",
            "volume": "2.081", "turnover": "34666.4005", "confirm": false,
            "timestamp": 1_672_324_988_882_i64
        }]));

        let events = normalize(&topic, raw);
        let candle = events[0].as_candle().unwrap();
        assert_eq!(candle.time, 1_672_324_800_000);
        assert_eq!(candle.open, 16649.5);
        assert_eq!(candle.close, 16677.0);
        assert_eq!(candle.low, 16608.0);
        assert_eq!(candle.turnover, 34666.4005);
        assert!(!candle.confirmed);
    }

    #[test]
    fn test_orderbook_snapshot_and_delta() {
        let topic = Topic::orderbook(ExchangeId::bybit(), symbol("ETHUSDT"));
        let snapshot = RawFrame {
            update_type: Some("snapshot".to_string()),
            ts: 1_700_000_000_000,
            data: json!({
                "s": "ETHUSDT",
                "b": [["1999.5", "2"], ["2000", "1.5"]],
                "a": [["2001", "3"], ["2000.5", "0.5"]],
                "u": 18521288,
                "seq": 7_961_638_724_i64
            }),
        };

        let events = normalize(&topic, snapshot);
        let book = events[0].as_orderbook().unwrap();
        assert_eq!(book.kind, BookUpdateKind::Snapshot);
        assert_eq!(book.bids[0], PriceLevel::new(2000.0, 1.5));
        assert_eq!(book.asks[0], PriceLevel::new(2000.5, 0.5));
        assert_eq!(book.update_id, 18_521_288);
        assert_eq!(book.time, 1_700_000_000_000);

        let delta = RawFrame {
            update_type: Some("delta".to_string()),
            ts: 1,
            data: json!({"s": "ETHUSDT", "b": [["1999", "0"], ["bad"]], "a": [], "u": 18521289}),
        };
        let events = normalize(&topic, delta);
        let book = events[0].as_orderbook().unwrap();
        assert_eq!(book.kind, BookUpdateKind::Delta);
        assert_eq!(book.bids, vec![PriceLevel::new(1999.0, 0.0)]);
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let normalizer = BybitNormalizer::new();
        let book = Topic::orderbook(ExchangeId::bybit(), symbol("ETHUSDT"));
        let trades = Topic::trades(ExchangeId::bybit(), symbol("ETHUSDT"));

        assert!(matches!(
            normalizer.normalize(&book, &RawFrame::new(json!([1, 2]))),
            Err(DataError::UnexpectedPayload { .. })
        ));
        assert!(matches!(
            normalizer.normalize(&trades, &RawFrame::new(json!("x"))),
            Err(DataError::UnexpectedPayload { .. })
        ));
    }

    #[test]
    fn test_parse_account() {
        let payload = json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {"list": [{
                "accountType": "UNIFIED",
                "totalEquity": "3.31216591",
                "totalWalletBalance": "3.00326056",
                "totalAvailableBalance": "2.99",
                "coin": [
                    {"coin": "BTC", "equity": "0.00011", "walletBalance": "0.00011", "availableToWithdraw": "0.0001"},
                    {"coin": "USDT", "equity": "1", "walletBalance": "1", "availableToWithdraw": "", "free": "0.5"}
                ]
            }]}
        });

        let account = parse_account(&payload).unwrap();
        assert_eq!(account.account_type, "UNIFIED");
        assert_eq!(account.total_equity, 3.312_165_91);
        assert_eq!(account.total_available_balance, 2.99);
        assert_eq!(account.balance("BTC").unwrap().available, 0.0001);
        assert_eq!(account.balance("USDT").unwrap().available, 0.5);
    }

    #[test]
    fn test_parse_account_requires_result() {
        assert!(matches!(
            parse_account(&json!({"retCode": 0})),
            Err(DataError::MissingData { .. })
        ));
        assert!(matches!(
            parse_account(&json!({"result": {"list": []}})),
            Err(DataError::MissingData { .. })
        ));
    }

    #[test]
    fn test_parse_open_orders() {
        let payload = json!({"result": {"list": [{
            "orderId": "fd4300ae",
            "orderLinkId": "",
            "symbol": "ETHUSDT",
            "side": "Buy",
            "orderType": "Limit",
            "price": "1600",
            "qty": "0.5",
            "cumExecQty": "0.1",
            "orderStatus": "PartiallyFilled",
            "createdTime": "1684738540559",
            "updatedTime": "1684738540561"
        }]}});

        let orders = parse_open_orders(&payload, &symbol("ETHUSDT")).unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id, "fd4300ae");
        assert_eq!(order.client_order_id, None);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_quantity, 0.1);
        assert_eq!(order.created_time, 1_684_738_540_559);
    }

    #[test]
    fn test_parse_klines_oldest_first() {
        let payload = json!({"result": {"symbol": "BTCUSDT", "category": "spot", "list": [
            ["1700000120000", "3", "3", "3", "3", "1", "3"],
            ["1700000060000", "2", "2", "2", "2", "1", "2"],
            ["1700000000000", "1", "1", "1", "1", "1", "1"]
        ]}});

        let candles = parse_klines(&payload, Interval::Minute1, 1_700_000_150_000).unwrap();
        let times: Vec<i64> = candles.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![1_700_000_000_000, 1_700_000_060_000, 1_700_000_120_000]);
        assert_eq!(candles[0].close, 1.0);
        assert!(candles[0].confirmed);
        assert!(candles[1].confirmed);
        assert!(!candles[2].confirmed);
    }
}
