//! Per-exchange capability contract.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::data::{Account, Candle, Order};
use crate::error::Result;
use crate::events::StatusEvent;
use crate::types::{ConnectionState, ExchangeId, Interval, Symbol};

use super::{Credentials, EventHandler, SubscriptionHandle};

/// Everything a consumer can ask of one exchange.
///
/// Adding an exchange means providing a new implementation of this trait.
/// Each `subscribe_*` call attaches one consumer to the topic's shared
/// upstream subscription; the returned handle removes exactly that consumer.
///
/// # Example
///
/// ```ignore
/// use relay_core::traits::{Exchange, handler_fn};
///
/// exchange.connect(None).await?;
/// let handle = exchange.subscribe_trades(&symbol, handler_fn(|_, event| {
///     tracing::info!(?event, "trade");
///     Ok(())
/// }))?;
/// let candles = exchange.get_historical_candles(&symbol, Interval::Hour1, Some(100)).await?;
/// handle.unsubscribe();
/// exchange.disconnect().await;
/// ```
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Identifier of this exchange.
    fn id(&self) -> &ExchangeId;

    /// Current stream connection state.
    fn state(&self) -> ConnectionState;

    /// Opens the stream connection and stores `credentials` for private
    /// REST calls. Resolves once the handshake completes; a no-op while
    /// already connected.
    async fn connect(&self, credentials: Option<Credentials>) -> Result<ConnectionState>;

    /// Closes the stream. Existing subscriptions are kept and replayed on
    /// the next `connect`.
    async fn disconnect(&self);

    /// Subscribes `handler` to public trades of `symbol`.
    fn subscribe_trades(
        &self,
        symbol: &Symbol,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle>;

    /// Subscribes `handler` to order-book updates of `symbol`.
    fn subscribe_orderbook(
        &self,
        symbol: &Symbol,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle>;

    /// Subscribes `handler` to candles of `symbol` at `interval`.
    fn subscribe_candles(
        &self,
        symbol: &Symbol,
        interval: Interval,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionHandle>;

    /// Queries wallet balances. Requires credentials.
    async fn get_account_info(&self) -> Result<Account>;

    /// Queries open orders for `symbol`. Requires credentials.
    async fn get_open_orders(&self, symbol: &Symbol) -> Result<Vec<Order>>;

    /// Queries historical candles, oldest first. `limit` defaults to the
    /// exchange's page size when `None`.
    async fn get_historical_candles(
        &self,
        symbol: &Symbol,
        interval: Interval,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>>;

    /// Receiver for connection and subscription status changes.
    fn status_events(&self) -> broadcast::Receiver<StatusEvent>;
}
