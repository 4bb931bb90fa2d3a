//! Logging configuration types.

use relay_core::config::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the logging system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_level")]
    pub level: String,

    /// Extra `target=level` directives, e.g. `relay_gateway::ws=trace`
    #[serde(default)]
    pub directives: Vec<String>,

    /// Output format for stdout
    #[serde(default)]
    pub format: LogFormat,

    /// Output targets
    #[serde(default = "default_outputs")]
    pub outputs: Vec<LogOutput>,

    /// Include thread IDs in log output
    #[serde(default)]
    pub include_thread_id: bool,

    /// Include file and line information
    #[serde(default)]
    pub include_file_info: bool,

    /// Include span open/close events
    #[serde(default)]
    pub include_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directives: Vec::new(),
            format: LogFormat::default(),
            outputs: default_outputs(),
            include_thread_id: false,
            include_file_info: false,
            include_span_events: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_outputs() -> Vec<LogOutput> {
    vec![LogOutput::Stdout]
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let mut outputs = Vec::new();
        if config.stdout_enabled {
            outputs.push(LogOutput::Stdout);
        }
        if let Some(directory) = &config.directory {
            outputs.push(LogOutput::File {
                path: directory.clone(),
                rotation: Some(RotationConfig::Daily),
            });
        }

        Self {
            level: config.level.to_lowercase(),
            format: if config.format.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            outputs,
            ..Self::default()
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for log aggregation systems
    Json,
    /// Human-readable format for development
    #[default]
    Pretty,
}

/// Log output target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to file with optional rotation
    File {
        /// Directory path for log files
        path: String,
        /// Rotation configuration
        rotation: Option<RotationConfig>,
    },
}

/// Log rotation configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationConfig {
    /// Rotate logs hourly
    Hourly,
    /// Rotate logs daily
    #[default]
    Daily,
    /// Never rotate (single file)
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.outputs.len(), 1);
    }

    #[test]
    fn test_config_serialization() {
        let config = LogConfig {
            level: "debug".to_string(),
            directives: vec!["relay_broker=trace".to_string()],
            format: LogFormat::Json,
            outputs: vec![
                LogOutput::Stdout,
                LogOutput::File {
                    path: "/var/log/relay".to_string(),
                    rotation: Some(RotationConfig::Hourly),
                },
            ],
            include_thread_id: true,
            include_file_info: true,
            include_span_events: true,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: LogConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.level, "debug");
        assert_eq!(parsed.format, LogFormat::Json);
        assert_eq!(parsed.outputs.len(), 2);
        assert_eq!(parsed.directives, vec!["relay_broker=trace".to_string()]);
    }

    #[test]
    fn test_from_relay_logging_config() {
        let relay = LoggingConfig {
            level: "DEBUG".to_string(),
            format: "json".to_string(),
            directory: Some("./logs".to_string()),
            stdout_enabled: false,
        };
        let config = LogConfig::from(&relay);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.outputs.len(), 1);
        assert!(matches!(
            &config.outputs[0],
            LogOutput::File { path, rotation: Some(RotationConfig::Daily) } if path == "./logs"
        ));
    }
}
