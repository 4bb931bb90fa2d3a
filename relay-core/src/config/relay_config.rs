//! Relay configuration structures.

use super::traits::{Configurable, Validatable};
use super::validation::{EnvOverride, ValidationContext, Validator};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level relay configuration.
///
/// # Example TOML
///
/// ```toml
/// [exchanges.bybit]
/// testnet = false
/// rate_limit_requests = 60
/// orderbook_depth = 200
///
/// [logging]
/// level = "info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Per-exchange settings keyed by exchange id.
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Returns the settings for `exchange`, or defaults if it is not configured.
    #[must_use]
    pub fn exchange(&self, exchange: &str) -> ExchangeConfig {
        self.exchanges.get(exchange).cloned().unwrap_or_default()
    }
}

impl Validatable for RelayConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();

        ctx.enter("exchanges");
        for (name, exchange) in &self.exchanges {
            ctx.enter(name);
            exchange.validate_with_context(&mut ctx);
            ctx.exit();
        }
        ctx.exit();

        ctx.enter("logging");
        self.logging.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.into_result()
    }
}

impl Configurable for RelayConfig {
    /// `RELAY_EXCHANGE_BYBIT_TESTNET=true` overrides `exchanges.bybit.testnet`;
    /// `RELAY_LOGGING_LEVEL=debug` overrides `logging.level`.
    fn apply_env_overrides(&mut self, prefix: &str) {
        for (name, exchange) in &mut self.exchanges {
            let section = format!("{prefix}_EXCHANGE_{}", name.to_uppercase());
            exchange.apply_env_overrides(&section);
        }
        self.logging
            .apply_env_overrides(&format!("{prefix}_LOGGING"));
    }
}

/// Settings for one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Whether this exchange is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Use the exchange's testnet endpoints.
    #[serde(default)]
    pub testnet: bool,

    /// REST base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_url: Option<String>,

    /// Stream URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// Receive window sent with signed requests (ms).
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,

    /// Requests allowed per rate-limit window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Length of the rate-limit window (ms).
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Lifetime of cached REST responses (ms).
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Order-book depth requested in stream topics.
    #[serde(default = "default_orderbook_depth")]
    pub orderbook_depth: u32,

    /// First reconnect delay (ms).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound for the reconnect delay (ms).
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Reconnect attempts before giving up (0 = unlimited).
    #[serde(default)]
    pub max_reconnect_attempts: u32,

    /// Application ping interval (ms).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Handshake timeout (ms).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// REST request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_enabled() -> bool {
    true
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

fn default_orderbook_depth() -> u32 {
    200
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    60_000
}

fn default_heartbeat_interval_ms() -> u64 {
    20_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            testnet: false,
            rest_url: None,
            ws_url: None,
            recv_window_ms: default_recv_window_ms(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            orderbook_depth: default_orderbook_depth(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: 0,
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ExchangeConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let mut validator = Validator::new(ctx);
        validator
            .positive("rate_limit_requests", &self.rate_limit_requests)
            .positive("rate_limit_window_ms", &self.rate_limit_window_ms)
            .positive("orderbook_depth", &self.orderbook_depth)
            .positive("heartbeat_interval_ms", &self.heartbeat_interval_ms)
            .positive("connect_timeout_ms", &self.connect_timeout_ms)
            .in_range("recv_window_ms", &self.recv_window_ms, &1, &60_000)
            .url_scheme("rest_url", self.rest_url.as_deref(), &["http", "https"])
            .url_scheme("ws_url", self.ws_url.as_deref(), &["ws", "wss"]);

        if self.max_reconnect_delay_ms < self.reconnect_delay_ms {
            ctx.add_error(ctx.invalid_value(
                "max_reconnect_delay_ms",
                "must not be smaller than reconnect_delay_ms",
            ));
        }
    }

    /// Cache lifetime as a `Duration`.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Rate-limit window as a `Duration`.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }
}

impl Configurable for ExchangeConfig {
    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_bool(&format!("{prefix}_ENABLED"), &mut self.enabled);
        EnvOverride::apply_bool(&format!("{prefix}_TESTNET"), &mut self.testnet);
        EnvOverride::apply_optional_string(&format!("{prefix}_REST_URL"), &mut self.rest_url);
        EnvOverride::apply_optional_string(&format!("{prefix}_WS_URL"), &mut self.ws_url);
        EnvOverride::apply_number(&format!("{prefix}_RECV_WINDOW_MS"), &mut self.recv_window_ms);
        EnvOverride::apply_number(
            &format!("{prefix}_RATE_LIMIT_REQUESTS"),
            &mut self.rate_limit_requests,
        );
        EnvOverride::apply_number(
            &format!("{prefix}_RATE_LIMIT_WINDOW_MS"),
            &mut self.rate_limit_window_ms,
        );
        EnvOverride::apply_number(&format!("{prefix}_CACHE_TTL_MS"), &mut self.cache_ttl_ms);
        EnvOverride::apply_number(
            &format!("{prefix}_ORDERBOOK_DEPTH"),
            &mut self.orderbook_depth,
        );
        EnvOverride::apply_number(
            &format!("{prefix}_RECONNECT_DELAY_MS"),
            &mut self.reconnect_delay_ms,
        );
        EnvOverride::apply_number(
            &format!("{prefix}_MAX_RECONNECT_ATTEMPTS"),
            &mut self.max_reconnect_attempts,
        );
    }
}

/// Logging settings consumed by the telemetry crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; no file output when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Whether to also log to stdout.
    #[serde(default = "default_stdout_enabled")]
    pub stdout_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_stdout_enabled() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
            stdout_enabled: default_stdout_enabled(),
        }
    }
}

impl LoggingConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let level = self.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            ctx.add_error(ctx.invalid_value("level", format!("unknown level '{}'", self.level)));
        }
        if !["json", "pretty"].contains(&self.format.as_str()) {
            ctx.add_error(ctx.invalid_value("format", format!("unknown format '{}'", self.format)));
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_LEVEL"), &mut self.level);
        EnvOverride::apply_string(&format!("{prefix}_FORMAT"), &mut self.format);
        EnvOverride::apply_optional_string(&format!("{prefix}_DIRECTORY"), &mut self.directory);
        EnvOverride::apply_bool(&format!("{prefix}_STDOUT_ENABLED"), &mut self.stdout_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_defaults_match_exchange_policy() {
        let config = ExchangeConfig::default();
        assert_eq!(config.rate_limit_requests, 60);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.recv_window_ms, 5000);
        assert_eq!(config.orderbook_depth, 200);
        assert_eq!(config.reconnect_delay_ms, 5000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RelayConfig = ConfigLoader::new()
            .load_str(
                "[exchanges.bybit]\ntestnet = true\ncache_ttl_ms = 1000\n",
                ConfigFormat::Toml,
            )
            .unwrap();
        let bybit = config.exchange("bybit");
        assert!(bybit.testnet);
        assert_eq!(bybit.cache_ttl_ms, 1000);
        assert_eq!(bybit.rate_limit_requests, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_exchange_gets_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.exchange("bybit").orderbook_depth, 200);
    }

    #[test]
    fn test_validation_reports_path() {
        let mut config = RelayConfig::default();
        config.exchanges.insert(
            "bybit".to_string(),
            ExchangeConfig {
                ws_url: Some("https://wrong-scheme".to_string()),
                ..ExchangeConfig::default()
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exchanges.bybit.ws_url"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = RelayConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
