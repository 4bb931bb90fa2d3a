//! Sensitive data masking for logs.
//!
//! API keys, secrets and request signatures must never reach a log line in
//! clear text. `mask_secret` handles values known to be sensitive;
//! `SensitiveDataMasker::mask_string` scrubs free-form text such as error
//! bodies echoed back by an exchange.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Patterns for detecting sensitive data.
static PATTERNS: LazyLock<Vec<SensitivePattern>> = LazyLock::new(|| {
    [
        // api_key=..., "apiKey": "...", X-API-KEY: ...
        (
            r#"(?i)(x-api-key|api[_-]?key|apikey)["\s:=]+["']?([a-zA-Z0-9]{8,64})["']?"#,
            2,
        ),
        // api_secret / secret_key
        (
            r#"(?i)(secret[_-]?key|secretkey|api[_-]?secret)["\s:=]+["']?([a-zA-Z0-9]{8,64})["']?"#,
            2,
        ),
        // Request signatures (hex HMAC digests)
        (
            r#"(?i)(x-api-sign|sign|signature)["\s:=]+["']?([a-fA-F0-9]{64})["']?"#,
            2,
        ),
        (r"(?i)bearer\s+([a-zA-Z0-9._-]{20,})", 1),
    ]
    .into_iter()
    .filter_map(|(pattern, group)| {
        Regex::new(pattern)
            .ok()
            .map(|regex| SensitivePattern { regex, group })
    })
    .collect()
});

struct SensitivePattern {
    regex: Regex,
    group: usize,
}

/// Masks a known secret as its first four and last four characters around
/// a fixed `****`. Values of eight characters or fewer are fully masked.
///
/// ```
/// use relay_telemetry::masking::mask_secret;
///
/// assert_eq!(mask_secret("abcdefghijklmnopwxyz"), "abcd****wxyz");
/// assert_eq!(mask_secret("short"), "*****");
/// ```
#[must_use]
pub fn mask_secret(value: &str) -> String {
    SensitiveDataMasker::new().mask_value(value)
}

/// Masks sensitive data in strings.
#[derive(Debug, Clone)]
pub struct SensitiveDataMasker {
    /// Values up to this length are masked entirely
    min_length: usize,
    /// Characters to show at start of masked value
    show_start: usize,
    /// Characters to show at end of masked value
    show_end: usize,
    /// Mask character
    mask_char: char,
}

impl Default for SensitiveDataMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitiveDataMasker {
    /// Create a new masker with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_length: 8,
            show_start: 4,
            show_end: 4,
            mask_char: '*',
        }
    }

    /// Create a masker with custom settings.
    #[must_use]
    pub fn with_settings(min_length: usize, show_start: usize, show_end: usize) -> Self {
        Self {
            min_length,
            show_start,
            show_end,
            mask_char: '*',
        }
    }

    /// Mask a known sensitive value.
    #[must_use]
    pub fn mask_value(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= self.min_length {
            return self.mask_char.to_string().repeat(chars.len());
        }

        let start: String = chars[..self.show_start.min(chars.len())].iter().collect();
        let end: String = chars[chars.len().saturating_sub(self.show_end)..]
            .iter()
            .collect();

        format!("{start}{}{end}", self.mask_char.to_string().repeat(4))
    }

    /// Mask sensitive data in a string using pattern detection.
    ///
    /// ```
    /// use relay_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// let masked = masker.mask_string(r#"{"apiKey": "ABCDEFGH12345678"}"#);
    /// assert!(!masked.contains("ABCDEFGH12345678"));
    /// ```
    #[must_use]
    pub fn mask_string<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut result = Cow::Borrowed(input);

        for pattern in PATTERNS.iter() {
            let replaced = pattern
                .regex
                .replace_all(&result, |caps: &regex::Captures<'_>| {
                    let whole = &caps[0];
                    caps.get(pattern.group).map_or_else(
                        || whole.to_string(),
                        |secret| whole.replace(secret.as_str(), &self.mask_value(secret.as_str())),
                    )
                });
            if let Cow::Owned(owned) = replaced {
                result = Cow::Owned(owned);
            }
        }

        result
    }

    /// Check if a string contains sensitive patterns.
    #[must_use]
    pub fn contains_sensitive(&self, input: &str) -> bool {
        PATTERNS.iter().any(|p| p.regex.is_match(input))
    }
}
