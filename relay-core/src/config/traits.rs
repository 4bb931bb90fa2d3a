//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Types that can check their own values.
pub trait Validatable {
    /// Returns the first invalid value found, if any.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Types whose values may be overridden from environment variables.
pub trait Configurable {
    /// Applies overrides from variables named `{prefix}_{FIELD}`.
    fn apply_env_overrides(&mut self, prefix: &str);
}
