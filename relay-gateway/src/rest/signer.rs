//! Request signing.
//!
//! Private requests carry four headers: the API key, the request timestamp,
//! the receive window and an HMAC-SHA256 signature over
//! `timestamp + api_key + recv_window + query_string`, hex encoded.

use hmac::{Hmac, Mac};
use relay_core::error::ExchangeError;
use relay_core::traits::Credentials;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key.
pub const HEADER_API_KEY: &str = "X-API-KEY";
/// Header carrying the request timestamp (ms).
pub const HEADER_TIMESTAMP: &str = "X-API-TIMESTAMP";
/// Header carrying the signature.
pub const HEADER_SIGN: &str = "X-API-SIGN";
/// Header carrying the receive window (ms).
pub const HEADER_RECV_WINDOW: &str = "X-API-RECV-WINDOW";

/// HMAC-SHA256 request signer.
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl RequestSigner {
    /// Creates a signer keyed by `secret`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Signs a message and returns the lowercase hex signature.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::AuthenticationFailed` if the key is rejected
    /// by the MAC.
    pub fn sign(&self, message: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| {
            ExchangeError::AuthenticationFailed {
                reason: format!("Failed to create HMAC: {e}"),
            }
        })?;

        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Authentication headers for one private request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// API key.
    pub api_key: String,
    /// Timestamp the signature was computed for (ms).
    pub timestamp: i64,
    /// Receive window (ms).
    pub recv_window: u64,
    /// Hex signature.
    pub signature: String,
}

impl SignedHeaders {
    /// Returns the headers as name/value pairs.
    #[must_use]
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        vec![
            (HEADER_API_KEY.to_string(), self.api_key.clone()),
            (HEADER_TIMESTAMP.to_string(), self.timestamp.to_string()),
            (HEADER_SIGN.to_string(), self.signature.clone()),
            (HEADER_RECV_WINDOW.to_string(), self.recv_window.to_string()),
        ]
    }
}

/// Signs a request whose query string is `query`.
///
/// # Errors
///
/// Returns `ExchangeError::AuthenticationFailed` if the credentials are
/// incomplete.
pub fn sign_request(
    credentials: &Credentials,
    timestamp: i64,
    recv_window: u64,
    query: &str,
) -> Result<SignedHeaders, ExchangeError> {
    if !credentials.is_complete() {
        return Err(ExchangeError::AuthenticationFailed {
            reason: "API key and secret are required".to_string(),
        });
    }

    let payload = format!("{timestamp}{}{recv_window}{query}", credentials.api_key);
    let signature = RequestSigner::new(credentials.api_secret()).sign(&payload)?;

    Ok(SignedHeaders {
        api_key: credentials.api_key.clone(),
        timestamp,
        recv_window,
        signature,
    })
}

/// Builds a query string from parameters.
///
/// Parameters are sorted by key and URL-encoded, so equal parameter sets
/// always produce the same string.
#[must_use]
pub fn build_query_string(params: &[(String, String)]) -> String {
    let mut sorted_params: Vec<_> = params.iter().collect();
    sorted_params.sort();

    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted_params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

/// Returns the current timestamp in milliseconds.
#[must_use]
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_hmac_sha256_hex() {
        let signer = RequestSigner::new("secret");
        let signature = signer.sign("message").unwrap();

        // Known HMAC-SHA256 result for "message" with key "secret"
        assert_eq!(
            signature,
            "8b5f48702995c1598c573db1e21866a9b825d4a794d169d7060a03605796360b"
        );
    }

    #[test]
    fn test_sign_request_known_vector() {
        let credentials = Credentials::new("XXXXXXXXXX", "YYYYYYYYYY");
        let signed = sign_request(&credentials, 1_658_384_314_791, 5000, "accountType=UNIFIED")
            .unwrap();
        assert_eq!(
            signed.signature,
            "b32cae975aed735f5030af235d2e23f8c4268cc6a0c74ebddd26f14fc39fce68"
        );
        assert_eq!(signed.timestamp, 1_658_384_314_791);
    }

    #[test]
    fn test_sign_request_with_sorted_query() {
        let credentials = Credentials::new("key", "secret");
        let query = build_query_string(&params(&[
            ("symbol", "BTCUSDT"),
            ("limit", "50"),
            ("category", "spot"),
        ]));
        assert_eq!(query, "category=spot&limit=50&symbol=BTCUSDT");

        let signed = sign_request(&credentials, 1_700_000_000_000, 5000, &query).unwrap();
        assert_eq!(
            signed.signature,
            "1e6bfc50263205f10ff201a51c6a608ed8f2172f50f95d3c18f9e44b50c3f811"
        );
    }

    #[test]
    fn test_header_pairs() {
        let credentials = Credentials::new("key", "secret");
        let signed = sign_request(&credentials, 1, 5000, "").unwrap();
        let headers = signed.header_pairs();
        let names: Vec<&str> = headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![HEADER_API_KEY, HEADER_TIMESTAMP, HEADER_SIGN, HEADER_RECV_WINDOW]
        );
        assert_eq!(headers[3].1, "5000");
    }

    #[test]
    fn test_incomplete_credentials_rejected() {
        let credentials = Credentials::new("key", "");
        let err = sign_request(&credentials, 1, 5000, "").unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_query_string_encodes_values() {
        let query = build_query_string(&params(&[("b", "x y"), ("a", "1&2")]));
        assert_eq!(query, "a=1%262&b=x+y");
    }

    #[test]
    fn test_timestamp_ms() {
        // After 2020
        assert!(timestamp_ms() > 1_577_836_800_000);
    }
}
