//! Configuration validation utilities.

use crate::error::ConfigError;
use tracing::warn;

/// Result type for validation operations.
pub type ValidationResult = Result<(), ConfigError>;

/// Tracks the current path in the configuration tree for error messages.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ConfigError>,
}

impl ValidationContext {
    /// Creates a new validation context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a new section in the configuration.
    pub fn enter(&mut self, section: impl Into<String>) {
        self.path.push(section.into());
    }

    /// Exits the current section.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Returns the current path as a dot-separated string.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Adds a validation error.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Returns true if there are no validation errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the collected validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Consumes the context and returns the first error, if any.
    pub fn into_result(self) -> ValidationResult {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }

    /// Creates a missing field error with the current path context.
    #[must_use]
    pub fn missing_field(&self, field: impl Into<String>) -> ConfigError {
        let section = if self.path.is_empty() {
            None
        } else {
            Some(self.current_path())
        };
        ConfigError::MissingField {
            field: field.into(),
            section,
        }
    }

    /// Creates an invalid value error with the current path context.
    #[must_use]
    pub fn invalid_value(&self, field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
        let field_name = field.into();
        let full_field = if self.path.is_empty() {
            field_name
        } else {
            format!("{}.{}", self.current_path(), field_name)
        };
        ConfigError::InvalidValue {
            field: full_field,
            reason: reason.into(),
        }
    }
}

/// Fluent field validator.
#[derive(Debug)]
pub struct Validator<'a> {
    ctx: &'a mut ValidationContext,
}

impl<'a> Validator<'a> {
    /// Creates a new validator with the given context.
    pub fn new(ctx: &'a mut ValidationContext) -> Self {
        Self { ctx }
    }

    /// Validates that a string field is not empty.
    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.ctx.add_error(self.ctx.missing_field(field));
        }
        self
    }

    /// Validates that a numeric value is within a range.
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
        min: &T,
        max: &T,
    ) -> &mut Self {
        if value < min || value > max {
            self.ctx.add_error(self.ctx.invalid_value(
                field,
                format!("Value {value} must be between {min} and {max}"),
            ));
        }
        self
    }

    /// Validates that a numeric value is positive.
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
    ) -> &mut Self {
        if *value <= T::default() {
            self.ctx.add_error(
                self.ctx
                    .invalid_value(field, format!("Value {value} must be positive")),
            );
        }
        self
    }

    /// Validates an optional URL against the allowed schemes.
    pub fn url_scheme(&mut self, field: &str, value: Option<&str>, schemes: &[&str]) -> &mut Self {
        if let Some(url) = value
            && !schemes.iter().any(|s| url.starts_with(&format!("{s}://")))
        {
            self.ctx.add_error(self.ctx.invalid_value(
                field,
                format!("Must start with one of: {}", schemes.join(", ")),
            ));
        }
        self
    }
}

/// Environment variable helper for applying overrides.
///
/// ```
/// use relay_core::config::EnvOverride;
///
/// let mut value = "default".to_string();
/// EnvOverride::apply_string("RELAY_DOC_UNSET_VAR", &mut value);
/// assert_eq!(value, "default");
/// ```
pub struct EnvOverride;

impl EnvOverride {
    /// Applies an environment variable override to a string value.
    pub fn apply_string(var_name: &str, target: &mut String) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value;
        }
    }

    /// Applies an environment variable override to an optional string value.
    pub fn apply_optional_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(var_name) {
            *target = Some(value);
        }
    }

    /// Applies an environment variable override to a numeric value.
    /// Unparseable values are logged and ignored.
    pub fn apply_number<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(value) = std::env::var(var_name) {
            match value.parse() {
                Ok(parsed) => *target = parsed,
                Err(_) => warn!(var = var_name, value = %value, "Ignoring non-numeric override"),
            }
        }
    }

    /// Applies an environment variable override to a boolean value.
    pub fn apply_bool(var_name: &str, target: &mut bool) {
        if let Ok(value) = std::env::var(var_name) {
            match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => *target = true,
                "false" | "0" | "no" | "off" => *target = false,
                _ => warn!(var = var_name, value = %value, "Ignoring non-boolean override"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_paths_in_errors() {
        let mut ctx = ValidationContext::new();
        ctx.enter("exchanges");
        ctx.enter("bybit");
        Validator::new(&mut ctx).positive("rate_limit_requests", &0u32);
        ctx.exit();
        ctx.exit();

        let err = ctx.into_result().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "exchanges.bybit.rate_limit_requests".to_string(),
                reason: "Value 0 must be positive".to_string(),
            }
        );
    }

    #[test]
    fn test_url_scheme() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx)
            .url_scheme("ws_url", Some("wss://stream.bybit.com"), &["ws", "wss"])
            .url_scheme("rest_url", None, &["https"]);
        assert!(ctx.is_valid());

        Validator::new(&mut ctx).url_scheme("rest_url", Some("ftp://x"), &["http", "https"]);
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_unset_env_leaves_value() {
        let mut flag = true;
        EnvOverride::apply_bool("RELAY_TEST_UNSET_FLAG_9f1c", &mut flag);
        assert!(flag);
        let mut n = 5u32;
        EnvOverride::apply_number("RELAY_TEST_UNSET_NUMBER_9f1c", &mut n);
        assert_eq!(n, 5);
    }
}
