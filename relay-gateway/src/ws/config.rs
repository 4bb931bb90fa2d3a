//! Stream connection configuration.

use relay_core::config::ExchangeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a `StreamConnection`.
///
/// Contains connection settings, reconnection parameters, and heartbeat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// WebSocket endpoint URL.
    pub url: String,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whether automatic reconnection is enabled.
    #[serde(default = "default_reconnect_enabled")]
    pub reconnect_enabled: bool,

    /// Maximum number of reconnection attempts (0 = unlimited).
    #[serde(default)]
    pub max_reconnect_attempts: u32,

    /// Initial reconnection delay in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum reconnection delay in milliseconds (for exponential backoff).
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Backoff multiplier for exponential backoff. `1.0` keeps the delay fixed.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Application ping interval in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// How long to wait for a pong after a ping, in milliseconds.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    /// Capacity of the outbound frame queue.
    #[serde(default = "default_send_queue_capacity")]
    pub send_queue_capacity: usize,

    /// Exchange identifier for logging.
    #[serde(default)]
    pub exchange: String,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_enabled() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    60_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_heartbeat_interval_ms() -> u64 {
    20_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_send_queue_capacity() -> usize {
    512
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_enabled: default_reconnect_enabled(),
            max_reconnect_attempts: 0,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            send_queue_capacity: default_send_queue_capacity(),
            exchange: String::new(),
        }
    }
}

impl WebSocketConfig {
    /// Creates a new builder for `WebSocketConfig`.
    #[must_use]
    pub fn builder() -> WebSocketConfigBuilder {
        WebSocketConfigBuilder::default()
    }

    /// Derives the stream settings from an exchange section.
    #[must_use]
    pub fn from_exchange_config(
        exchange: impl Into<String>,
        url: impl Into<String>,
        config: &ExchangeConfig,
    ) -> Self {
        Self {
            url: url.into(),
            connect_timeout_ms: config.connect_timeout_ms,
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay_ms: config.reconnect_delay_ms,
            max_reconnect_delay_ms: config.max_reconnect_delay_ms,
            heartbeat_interval_ms: config.heartbeat_interval_ms,
            exchange: exchange.into(),
            ..Self::default()
        }
    }

    /// Returns the connection timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the heartbeat interval as a Duration.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Returns the pong timeout as a Duration.
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    /// Calculates the reconnect delay for a given attempt using exponential backoff.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn calculate_reconnect_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(32) as i32;
        let delay = self.reconnect_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped_delay = delay.min(self.max_reconnect_delay_ms as f64) as u64;
        Duration::from_millis(capped_delay)
    }

    /// Returns whether reconnection should be attempted.
    #[must_use]
    pub fn should_reconnect(&self, attempt: u32) -> bool {
        self.reconnect_enabled
            && (self.max_reconnect_attempts == 0 || attempt < self.max_reconnect_attempts)
    }
}

/// Builder for `WebSocketConfig`.
#[derive(Debug, Default)]
pub struct WebSocketConfigBuilder {
    config: Option<WebSocketConfig>,
}

impl WebSocketConfigBuilder {
    fn config(&mut self) -> &mut WebSocketConfig {
        self.config.get_or_insert_with(WebSocketConfig::default)
    }

    /// Sets the WebSocket URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config().url = url.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config().connect_timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets whether reconnection is enabled.
    #[must_use]
    pub fn reconnect_enabled(mut self, enabled: bool) -> Self {
        self.config().reconnect_enabled = enabled;
        self
    }

    /// Sets the maximum reconnection attempts.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config().max_reconnect_attempts = attempts;
        self
    }

    /// Sets the initial reconnection delay.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config().reconnect_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the maximum reconnection delay.
    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.config().max_reconnect_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config().backoff_multiplier = multiplier;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config().heartbeat_interval_ms = duration_ms(interval);
        self
    }

    /// Sets the pong timeout.
    #[must_use]
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.config().pong_timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets the outbound queue capacity.
    #[must_use]
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.config().send_queue_capacity = capacity.max(1);
        self
    }

    /// Sets the exchange identifier.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.config().exchange = exchange.into();
        self
    }

    /// Builds the `WebSocketConfig`.
    #[must_use]
    pub fn build(self) -> WebSocketConfig {
        self.config.unwrap_or_default()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WebSocketConfig::builder()
            .url("wss://stream.bybit.com/v5/public/spot")
            .exchange("bybit")
            .connect_timeout(Duration::from_secs(15))
            .reconnect_enabled(true)
            .max_reconnect_attempts(5)
            .build();

        assert_eq!(config.url, "wss://stream.bybit.com/v5/public/spot");
        assert_eq!(config.exchange, "bybit");
        assert_eq!(config.connect_timeout(), Duration::from_secs(15));
        assert!(config.reconnect_enabled);
        assert_eq!(config.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_config_defaults() {
        let config = WebSocketConfig::default();

        assert!(config.url.is_empty());
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(20));
        assert_eq!(config.reconnect_delay_ms, 5_000);
        assert_eq!(config.max_reconnect_attempts, 0);
    }

    #[test]
    fn test_exponential_backoff() {
        let config = WebSocketConfig::builder()
            .reconnect_delay(Duration::from_secs(1))
            .max_reconnect_delay(Duration::from_secs(60))
            .backoff_multiplier(2.0)
            .build();

        assert_eq!(config.calculate_reconnect_delay(0), Duration::from_secs(1));
        assert_eq!(config.calculate_reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(config.calculate_reconnect_delay(3), Duration::from_secs(8));
        assert_eq!(
            config.calculate_reconnect_delay(10),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.calculate_reconnect_delay(u32::MAX),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_fixed_delay_with_unit_multiplier() {
        let config = WebSocketConfig::builder().backoff_multiplier(1.0).build();
        for attempt in 0..5 {
            assert_eq!(
                config.calculate_reconnect_delay(attempt),
                Duration::from_secs(5)
            );
        }
    }

    #[test]
    fn test_should_reconnect() {
        let config = WebSocketConfig::builder()
            .reconnect_enabled(true)
            .max_reconnect_attempts(3)
            .build();

        assert!(config.should_reconnect(0));
        assert!(config.should_reconnect(2));
        assert!(!config.should_reconnect(3));

        let unlimited = WebSocketConfig::builder().max_reconnect_attempts(0).build();
        assert!(unlimited.should_reconnect(100));

        let disabled = WebSocketConfig::builder().reconnect_enabled(false).build();
        assert!(!disabled.should_reconnect(0));
    }

    #[test]
    fn test_from_exchange_config() {
        let exchange = ExchangeConfig {
            heartbeat_interval_ms: 15_000,
            max_reconnect_attempts: 7,
            ..ExchangeConfig::default()
        };
        let config = WebSocketConfig::from_exchange_config("bybit", "wss://x", &exchange);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(15));
        assert_eq!(config.max_reconnect_attempts, 7);
        assert_eq!(config.exchange, "bybit");
    }
}
