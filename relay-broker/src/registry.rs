//! Registry of the exchanges the relay is connected to.

use futures::future::join_all;
use parking_lot::RwLock;
use relay_core::error::{ConfigError, Result};
use relay_core::traits::{Credentials, Exchange};
use relay_core::types::{ConnectionState, ExchangeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Owned map of exchange adapters keyed by id.
///
/// Handles are cloned out of the lock before any await, so connecting or
/// disconnecting one exchange never blocks lookups of another.
#[derive(Default)]
pub struct ExchangeRegistry {
    exchanges: RwLock<HashMap<ExchangeId, Arc<dyn Exchange>>>,
}

impl ExchangeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exchange, returning the one it replaced.
    pub fn register(&self, exchange: Arc<dyn Exchange>) -> Option<Arc<dyn Exchange>> {
        let id = exchange.id().clone();
        info!(exchange = %id, "Registered exchange");
        self.exchanges.write().insert(id, exchange)
    }

    /// Looks up an exchange.
    #[must_use]
    pub fn get(&self, id: &ExchangeId) -> Option<Arc<dyn Exchange>> {
        self.exchanges.read().get(id).cloned()
    }

    /// Removes an exchange without disconnecting it.
    pub fn remove(&self, id: &ExchangeId) -> Option<Arc<dyn Exchange>> {
        self.exchanges.write().remove(id)
    }

    /// Registered exchange ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ExchangeId> {
        let mut ids: Vec<ExchangeId> = self.exchanges.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.read().is_empty()
    }

    /// Connects a registered exchange.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `id` is not registered, or
    /// whatever the exchange's own `connect` returns.
    pub async fn connect(
        &self,
        id: &ExchangeId,
        credentials: Option<Credentials>,
    ) -> Result<ConnectionState> {
        let exchange = self.get(id).ok_or_else(|| {
            ConfigError::invalid_value("exchange", format!("'{id}' is not registered"))
        })?;
        exchange.connect(credentials).await
    }

    /// Disconnects every registered exchange concurrently.
    pub async fn disconnect_all(&self) {
        let exchanges: Vec<Arc<dyn Exchange>> = self.exchanges.read().values().cloned().collect();
        info!(count = exchanges.len(), "Disconnecting all exchanges");
        join_all(exchanges.iter().map(|exchange| exchange.disconnect())).await;
    }
}

impl std::fmt::Debug for ExchangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRegistry")
            .field("exchanges", &self.ids())
            .finish()
    }
}
