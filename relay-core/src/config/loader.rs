//! Configuration text parsing.
//!
//! The host application owns configuration files; this module only turns
//! the text it hands over into typed structures.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// TOML
    #[default]
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension (`toml`, `json`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Returns the lowercase name of this format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Configuration loader with optional environment overrides.
///
/// # Example
///
/// ```
/// use relay_core::config::{ConfigFormat, ConfigLoader, RelayConfig};
///
/// let config: RelayConfig = ConfigLoader::new()
///     .load_str("[exchanges.bybit]\ntestnet = true\n", ConfigFormat::Toml)
///     .unwrap();
/// assert!(config.exchanges["bybit"].testnet);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Environment variable prefix for overrides.
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the environment variable prefix used by [`load_configurable`](Self::load_configurable).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Returns the environment variable prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Parses `content` in the given format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` if the content cannot be parsed.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let invalid = |reason: String| ConfigError::InvalidFormat {
            format: format.as_str().to_string(),
            reason,
        };
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string())),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| invalid(e.to_string()))
            }
        }
    }

    /// Parses `content`, applies environment overrides under the configured
    /// prefix, then validates.
    ///
    /// # Errors
    ///
    /// Returns a parse error or the first validation error.
    pub fn load_configurable<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + super::Configurable + super::Validatable,
    {
        let mut config: T = self.load_str(content, format)?;
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix);
        }
        config.validate()?;
        Ok(config)
    }

    /// Serializes a configuration in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize<T>(config: &T, format: ConfigFormat) -> Result<String, ConfigError>
    where
        T: serde::Serialize,
    {
        let invalid = |reason: String| ConfigError::InvalidFormat {
            format: format.as_str().to_string(),
            reason,
        };
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| invalid(e.to_string())),
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| invalid(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        limit: u32,
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_load_toml() {
        let sample: Sample = ConfigLoader::new()
            .load_str("name = \"bybit\"\nlimit = 60\n", ConfigFormat::Toml)
            .unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "bybit".to_string(),
                limit: 60
            }
        );
    }

    #[test]
    fn test_load_json() {
        let sample: Sample = ConfigLoader::new()
            .load_str(r#"{"name":"bybit","limit":10}"#, ConfigFormat::Json)
            .unwrap();
        assert_eq!(sample.limit, 10);
    }

    #[test]
    fn test_invalid_content() {
        let result: Result<Sample, _> = ConfigLoader::new().load_str("name = ", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::InvalidFormat { .. })));
    }
}
