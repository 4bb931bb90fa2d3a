//! Configuration management.
//!
//! - TOML and JSON parsing of configuration text
//! - Validation with path-qualified error messages
//! - Environment variable overrides
//!
//! ```rust,ignore
//! use relay_core::config::{ConfigFormat, ConfigLoader, RelayConfig};
//!
//! let config: RelayConfig = ConfigLoader::new()
//!     .with_env_prefix("RELAY")
//!     .load_configurable(&text, ConfigFormat::Toml)?;
//! ```

mod loader;
mod relay_config;
mod traits;
pub mod validation;

pub use loader::{ConfigFormat, ConfigLoader};
pub use relay_config::{ExchangeConfig, LoggingConfig, RelayConfig};
pub use traits::{Configurable, Validatable};
pub use validation::{EnvOverride, ValidationContext, ValidationResult, Validator};
