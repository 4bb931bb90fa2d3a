//! Bybit exchange adapter.

use async_trait::async_trait;
use relay_broker::SubscriptionBroker;
use relay_core::config::ExchangeConfig;
use relay_core::data::{Account, Candle, Order};
use relay_core::error::{ExchangeError, RelayError, Result};
use relay_core::events::StatusEvent;
use relay_core::traits::{
    Credentials, EventHandler, Exchange, StreamObserver, StreamSink, SubscriptionHandle,
};
use relay_core::types::{ConnectionState, ExchangeId, Interval, Symbol, Topic};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::normalizer::{BybitNormalizer, parse_account, parse_klines, parse_open_orders};
use super::types::{
    BybitEndpoints, DEFAULT_KLINE_LIMIT, KLINE_PATH, MAX_KLINE_LIMIT, OPEN_ORDERS_LIMIT,
    OPEN_ORDERS_PATH, WALLET_BALANCE_PATH,
};
use crate::rest::{Auth, RestConfig, RestGateway, timestamp_ms};
use crate::ws::{StreamConnection, TopicRouter, WebSocketConfig};

const SPOT_CATEGORY: &str = "spot";
const UNIFIED_ACCOUNT: &str = "UNIFIED";

/// Bybit v5 spot adapter.
///
/// Owns the public stream connection and its subscription broker, and a
/// route on a (possibly shared) [`RestGateway`].
///
/// # Example
///
/// ```ignore
/// use relay_core::config::ExchangeConfig;
/// use relay_core::traits::Exchange;
///
/// let bybit = BybitExchange::new(&ExchangeConfig::default())?;
/// bybit.connect(None).await?;
/// let (consumer, mut rx) = ChannelConsumer::channel(1024);
/// let handle = bybit.subscribe_trades(&Symbol::new("BTCUSDT")?, consumer)?;
/// ```
pub struct BybitExchange {
    id: ExchangeId,
    endpoints: BybitEndpoints,
    connection: Arc<StreamConnection>,
    broker: Arc<SubscriptionBroker>,
    rest: Arc<RestGateway>,
}

impl BybitExchange {
    /// Creates an adapter with its own `reqwest`-backed REST gateway.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let rest = RestGateway::with_reqwest()?;
        Ok(Self::with_gateway(config, Arc::new(rest)))
    }

    /// Creates an adapter that registers its REST route on `rest`.
    #[must_use]
    pub fn with_gateway(config: &ExchangeConfig, rest: Arc<RestGateway>) -> Self {
        let id = ExchangeId::bybit();
        let endpoints = BybitEndpoints::from_config(config);

        let ws_config =
            WebSocketConfig::from_exchange_config(id.as_str(), &endpoints.ws_url, config);
        let router = TopicRouter::new(id.clone()).with_orderbook_depth(config.orderbook_depth);
        let connection = Arc::new(StreamConnection::new(ws_config, router));

        let sink: Arc<dyn StreamSink> = connection.clone();
        let broker = SubscriptionBroker::new(sink, Arc::new(BybitNormalizer::new()));
        let observer: Arc<dyn StreamObserver> = broker.clone();
        connection.set_observer(&observer);

        rest.register_exchange(
            id.clone(),
            RestConfig::from_exchange_config(id.as_str(), &endpoints.rest_url, config),
        );

        info!(
            exchange = %id,
            rest_url = %endpoints.rest_url,
            ws_url = %endpoints.ws_url,
            testnet = endpoints.testnet,
            "Created exchange adapter"
        );

        Self {
            id,
            endpoints,
            connection,
            broker,
            rest,
        }
    }

    /// Subscription broker of the public stream.
    #[must_use]
    pub fn broker(&self) -> &Arc<SubscriptionBroker> {
        &self.broker
    }

    /// Public stream connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<StreamConnection> {
        &self.connection
    }

    /// Resolved endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &BybitEndpoints {
        &self.endpoints
    }

    fn subscribe(
        &self,
        topic: Topic,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle> {
        let consumer = self.broker.next_consumer_id();
        Ok(self.broker.subscribe(topic, consumer, handler)?)
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        auth: Auth,
    ) -> Result<serde_json::Value> {
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        self.rest.request(&self.id, endpoint, &params, auth).await
    }
}

#[async_trait]
impl Exchange for BybitExchange {
    fn id(&self) -> &ExchangeId {
        &self.id
    }

    fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    async fn connect(&self, credentials: Option<Credentials>) -> Result<ConnectionState> {
        if let Some(credentials) = credentials {
            if !credentials.is_complete() {
                return Err(ExchangeError::AuthenticationFailed {
                    reason: "API key and secret are both required".to_string(),
                }
                .into());
            }
            if credentials.testnet != self.endpoints.testnet {
                warn!(
                    exchange = %self.id,
                    credentials_testnet = credentials.testnet,
                    endpoints_testnet = self.endpoints.testnet,
                    "Credentials and endpoints disagree on testnet"
                );
            }
            debug!(exchange = %self.id, api_key = %credentials.masked_key(), "Stored credentials");
            self.rest.set_credentials(&self.id, Some(credentials))?;
        }

        self.connection.connect().await?;
        Ok(self.connection.state())
    }

    async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    fn subscribe_trades(
        &self,
        symbol: &Symbol,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle> {
        self.subscribe(Topic::trades(self.id.clone(), symbol.clone()), handler)
    }

    fn subscribe_orderbook(
        &self,
        symbol: &Symbol,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle> {
        self.subscribe(Topic::orderbook(self.id.clone(), symbol.clone()), handler)
    }

    fn subscribe_candles(
        &self,
        symbol: &Symbol,
        interval: Interval,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle> {
        self.subscribe(
            Topic::candles(self.id.clone(), symbol.clone(), interval),
            handler,
        )
    }

    async fn get_account_info(&self) -> Result<Account> {
        let payload = self
            .get(
                WALLET_BALANCE_PATH,
                &[("accountType", UNIFIED_ACCOUNT.to_string())],
                Auth::Private,
            )
            .await?;
        Ok(parse_account(&payload)?)
    }

    async fn get_open_orders(&self, symbol: &Symbol) -> Result<Vec<Order>> {
        let payload = self
            .get(
                OPEN_ORDERS_PATH,
                &[
                    ("category", SPOT_CATEGORY.to_string()),
                    ("symbol", symbol.to_string()),
                    ("limit", OPEN_ORDERS_LIMIT.to_string()),
                ],
                Auth::Private,
            )
            .await?;
        Ok(parse_open_orders(&payload, symbol)?)
    }

    async fn get_historical_candles(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>> {
        let limit = limit
            .unwrap_or(DEFAULT_KLINE_LIMIT)
            .clamp(1, MAX_KLINE_LIMIT);
        let payload = self
            .get(
                KLINE_PATH,
                &[
                    ("category", SPOT_CATEGORY.to_string()),
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
                Auth::Public,
            )
            .await?;
        parse_klines(&payload, interval, timestamp_ms()).map_err(RelayError::from)
    }

    fn status_events(&self) -> broadcast::Receiver<StatusEvent> {
        self.broker.status_events()
    }
}

impl std::fmt::Debug for BybitExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitExchange")
            .field("endpoints", &self.endpoints)
            .field("state", &self.connection.state())
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}
