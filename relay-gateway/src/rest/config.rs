//! REST gateway configuration.

use relay_core::config::ExchangeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one exchange's REST route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL for API requests.
    pub base_url: String,

    /// Exchange identifier for logging.
    #[serde(default)]
    pub exchange: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Receive window sent with signed requests, in milliseconds.
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,

    /// Requests allowed per rate-limit window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Length of the rate-limit window in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// How long successful responses are served from cache, in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_recv_window_ms() -> u64 {
    5_000
}

fn default_rate_limit_requests() -> u32 {
    60
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_cache_ttl_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("Relay/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            exchange: String::new(),
            timeout_ms: default_timeout_ms(),
            recv_window_ms: default_recv_window_ms(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl RestConfig {
    /// Creates a new builder for `RestConfig`.
    #[must_use]
    pub fn builder() -> RestConfigBuilder {
        RestConfigBuilder::default()
    }

    /// Derives a REST route configuration from an exchange section.
    #[must_use]
    pub fn from_exchange_config(
        exchange: impl Into<String>,
        base_url: impl Into<String>,
        config: &ExchangeConfig,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            exchange: exchange.into(),
            timeout_ms: config.request_timeout_ms,
            recv_window_ms: config.recv_window_ms,
            rate_limit_requests: config.rate_limit_requests,
            rate_limit_window_ms: config.rate_limit_window_ms,
            cache_ttl_ms: config.cache_ttl_ms,
            user_agent: default_user_agent(),
        }
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the rate-limit window as a Duration.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// Returns the cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Joins `endpoint` onto the base URL.
    #[must_use]
    pub fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
        }
    }
}

/// Builder for `RestConfig`.
#[derive(Debug, Default)]
pub struct RestConfigBuilder {
    base_url: Option<String>,
    exchange: Option<String>,
    timeout_ms: Option<u64>,
    recv_window_ms: Option<u64>,
    rate_limit_requests: Option<u32>,
    rate_limit_window_ms: Option<u64>,
    cache_ttl_ms: Option<u64>,
    user_agent: Option<String>,
}

impl RestConfigBuilder {
    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the exchange identifier.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Sets the receive window for signed requests.
    #[must_use]
    pub fn recv_window_ms(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = Some(recv_window_ms);
        self
    }

    /// Sets the rate limit as `requests` per `window`.
    #[must_use]
    pub fn rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.rate_limit_requests = Some(requests);
        self.rate_limit_window_ms = Some(duration_ms(window));
        self
    }

    /// Sets the cache TTL.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = Some(duration_ms(ttl));
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the `RestConfig`.
    #[must_use]
    pub fn build(self) -> RestConfig {
        RestConfig {
            base_url: self.base_url.unwrap_or_default(),
            exchange: self.exchange.unwrap_or_default(),
            timeout_ms: self.timeout_ms.unwrap_or_else(default_timeout_ms),
            recv_window_ms: self.recv_window_ms.unwrap_or_else(default_recv_window_ms),
            rate_limit_requests: self
                .rate_limit_requests
                .unwrap_or_else(default_rate_limit_requests),
            rate_limit_window_ms: self
                .rate_limit_window_ms
                .unwrap_or_else(default_rate_limit_window_ms),
            cache_ttl_ms: self.cache_ttl_ms.unwrap_or_else(default_cache_ttl_ms),
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RestConfig::builder()
            .base_url("https://api.bybit.com")
            .exchange("bybit")
            .timeout(Duration::from_secs(15))
            .rate_limit(120, Duration::from_secs(60))
            .cache_ttl(Duration::from_secs(5))
            .build();

        assert_eq!(config.base_url, "https://api.bybit.com");
        assert_eq!(config.exchange, "bybit");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.rate_limit_requests, 120);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_defaults() {
        let config = RestConfig::default();

        assert!(config.base_url.is_empty());
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.recv_window_ms, 5_000);
        assert_eq!(config.rate_limit_requests, 60);
        assert_eq!(config.rate_limit_window_ms, 60_000);
        assert_eq!(config.cache_ttl_ms, 30_000);
        assert!(config.user_agent.starts_with("Relay/"));
    }

    #[test]
    fn test_from_exchange_config() {
        let exchange = ExchangeConfig {
            recv_window_ms: 10_000,
            rate_limit_requests: 10,
            request_timeout_ms: 2_000,
            ..ExchangeConfig::default()
        };
        let config =
            RestConfig::from_exchange_config("bybit", "https://api-testnet.bybit.com", &exchange);

        assert_eq!(config.exchange, "bybit");
        assert_eq!(config.recv_window_ms, 10_000);
        assert_eq!(config.rate_limit_requests, 10);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_build_url() {
        let config = RestConfig::builder()
            .base_url("https://api.bybit.com/")
            .build();
        assert_eq!(
            config.build_url("/v5/market/kline"),
            "https://api.bybit.com/v5/market/kline"
        );
        assert_eq!(config.build_url("https://other/x"), "https://other/x");
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: RestConfig =
            serde_json::from_str(r#"{"base_url":"https://api.bybit.com"}"#).unwrap();
        assert_eq!(config.rate_limit_requests, 60);
        assert_eq!(config.cache_ttl_ms, 30_000);
    }
}
