//! Bybit-specific endpoints and wire formats.
//!
//! Stream payloads use single-letter field names and send numbers as
//! strings; REST payloads use camelCase names, also with string numbers.
//! Numeric fields are kept as raw JSON here and converted at the
//! normalizer boundary so that a missing or malformed number becomes `0`
//! instead of failing the whole record.

#![allow(clippy::doc_markdown)]

use relay_core::config::ExchangeConfig;
use serde::Deserialize;
use serde_json::Value;

/// Mainnet REST base URL.
pub const MAINNET_REST_URL: &str = "https://api.bybit.com";
/// Mainnet public spot stream URL.
pub const MAINNET_WS_URL: &str = "wss://stream.bybit.com/v5/public/spot";
/// Testnet REST base URL.
pub const TESTNET_REST_URL: &str = "https://api-testnet.bybit.com";
/// Testnet public spot stream URL.
pub const TESTNET_WS_URL: &str = "wss://stream-testnet.bybit.com/v5/public/spot";

/// Wallet balance endpoint (private).
pub const WALLET_BALANCE_PATH: &str = "/v5/account/wallet-balance";
/// Open orders endpoint (private).
pub const OPEN_ORDERS_PATH: &str = "/v5/order/realtime";
/// Kline endpoint (public).
pub const KLINE_PATH: &str = "/v5/market/kline";

/// Candles returned when no limit is given.
pub const DEFAULT_KLINE_LIMIT: u32 = 200;
/// Largest kline page the exchange serves.
pub const MAX_KLINE_LIMIT: u32 = 1000;
/// Page size for open orders.
pub const OPEN_ORDERS_LIMIT: u32 = 50;

/// Resolved REST and stream URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BybitEndpoints {
    /// REST base URL.
    pub rest_url: String,
    /// Public stream URL.
    pub ws_url: String,
    /// Whether these are testnet endpoints.
    pub testnet: bool,
}

impl BybitEndpoints {
    /// Mainnet endpoints.
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            rest_url: MAINNET_REST_URL.to_string(),
            ws_url: MAINNET_WS_URL.to_string(),
            testnet: false,
        }
    }

    /// Testnet endpoints.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            rest_url: TESTNET_REST_URL.to_string(),
            ws_url: TESTNET_WS_URL.to_string(),
            testnet: true,
        }
    }

    /// Picks mainnet or testnet from `config.testnet`, then applies any
    /// explicit `rest_url` / `ws_url` override.
    #[must_use]
    pub fn from_config(config: &ExchangeConfig) -> Self {
        let mut endpoints = if config.testnet {
            Self::testnet()
        } else {
            Self::mainnet()
        };
        if let Some(rest_url) = &config.rest_url {
            endpoints.rest_url.clone_from(rest_url);
        }
        if let Some(ws_url) = &config.ws_url {
            endpoints.ws_url.clone_from(ws_url);
        }
        endpoints
    }
}

/// Public trade record (`publicTrade` topic).
///
/// Also accepts the long field names `id`, `timestamp`, `price`, `size`,
/// `side` and `symbol`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BybitTrade {
    /// Trade id
    #[serde(default, rename = "i", alias = "id")]
    pub id: Value,
    /// Trade time (ms)
    #[serde(default, rename = "T", alias = "timestamp")]
    pub time: Value,
    /// Price
    #[serde(default, rename = "p", alias = "price")]
    pub price: Value,
    /// Size
    #[serde(default, rename = "v", alias = "size")]
    pub size: Value,
    /// Taker side, `Buy` or `Sell`
    #[serde(default, rename = "S", alias = "side")]
    pub side: Option<String>,
    /// Symbol
    #[serde(default, rename = "s", alias = "symbol")]
    pub symbol: Option<String>,
}

/// Candle record (`kline` topic).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BybitKline {
    /// Start time (ms)
    #[serde(default)]
    pub start: Value,
    /// Open price
    #[serde(default)]
    pub open: Value,
    /// High price
    #[serde(default)]
    pub high: Value,
    /// Low price
    #[serde(default)]
    pub low: Value,
    /// Close price
    #[serde(default)]
    pub close: Value,
    /// Base volume
    #[serde(default)]
    pub volume: Value,
    /// Quote turnover
    #[serde(default)]
    pub turnover: Value,
    /// Whether the candle is closed
    #[serde(default)]
    pub confirm: bool,
}

/// Order book payload (`orderbook` topic).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BybitOrderBook {
    /// Symbol
    #[serde(default)]
    pub s: Option<String>,
    /// Bids as `[price, size]`
    #[serde(default)]
    pub b: Vec<Vec<Value>>,
    /// Asks as `[price, size]`
    #[serde(default)]
    pub a: Vec<Vec<Value>>,
    /// Update id
    #[serde(default)]
    pub u: u64,
    /// Cross sequence
    #[serde(default)]
    pub seq: u64,
}

/// `result` member holding a `list`.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitList<T> {
    /// Items
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

/// One account from `/v5/account/wallet-balance`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BybitWalletAccount {
    /// Account type (`UNIFIED`)
    pub account_type: String,
    /// Total equity in USD
    pub total_equity: String,
    /// Total wallet balance in USD
    pub total_wallet_balance: String,
    /// Total available balance in USD
    pub total_available_balance: String,
    /// Per-coin balances
    pub coin: Vec<BybitCoinBalance>,
}

/// One coin inside a wallet account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BybitCoinBalance {
    /// Coin name
    pub coin: String,
    /// Equity
    pub equity: String,
    /// Wallet balance
    pub wallet_balance: String,
    /// Withdrawable amount
    pub available_to_withdraw: String,
    /// Free balance (spot accounts)
    pub free: String,
}

/// One order from `/v5/order/realtime`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BybitOrder {
    /// Exchange order id
    pub order_id: String,
    /// Client order id
    pub order_link_id: String,
    /// Symbol
    pub symbol: String,
    /// `Buy` / `Sell`
    pub side: String,
    /// `Limit` / `Market`
    pub order_type: String,
    /// Limit price
    pub price: String,
    /// Order quantity
    pub qty: String,
    /// Filled quantity
    pub cum_exec_qty: String,
    /// Order status
    pub order_status: String,
    /// Creation time (ms)
    pub created_time: String,
    /// Last update time (ms)
    pub updated_time: String,
}
