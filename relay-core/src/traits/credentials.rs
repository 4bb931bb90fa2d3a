//! Authentication credentials for exchange APIs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// API key/secret pair.
///
/// Owned by the caller and handed to the signer by reference. The secret is
/// never serialized and `Debug` masks both values.
///
/// # Examples
///
/// ```
/// use relay_core::traits::Credentials;
///
/// let creds = Credentials::new("my_api_key_12345", "my_api_secret");
/// let debug = format!("{creds:?}");
/// assert!(!debug.contains("my_api_secret"));
/// assert!(!debug.contains("my_api_key_12345"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// API key for authentication.
    pub api_key: String,

    /// API secret for signing requests.
    #[serde(skip_serializing, default)]
    api_secret: String,

    /// Whether this is a testnet account.
    #[serde(default)]
    pub testnet: bool,
}

impl Credentials {
    /// Creates new credentials with API key and secret.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            testnet: false,
        }
    }

    /// Sets whether this is a testnet account.
    #[must_use]
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Returns the API secret.
    ///
    /// Only the signer should call this.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Returns true if both key and secret are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Key with all but the first and last four characters masked.
    #[must_use]
    pub fn masked_key(&self) -> String {
        mask(&self.api_key)
    }
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.masked_key())
            .field("api_secret", &"<redacted>")
            .field("testnet", &self.testnet)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_key() {
        let creds = Credentials::new("ABCDEFGHIJKLMNOP", "secret");
        assert_eq!(creds.masked_key(), "ABCD****MNOP");
        assert_eq!(Credentials::new("short", "s").masked_key(), "*****");
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let creds = Credentials::new("key", "super-secret");
        let json = serde_json::to_string(&creds).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("\"api_key\":\"key\""));
    }

    #[test]
    fn test_is_complete() {
        assert!(Credentials::new("k", "s").is_complete());
        assert!(!Credentials::new("k", "").is_complete());
    }
}
