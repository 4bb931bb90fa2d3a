//! REST gateway with per-exchange rate limiting, signing and caching.

use async_trait::async_trait;
use parking_lot::RwLock;
use relay_core::error::{ExchangeError, NetworkError, RelayError};
use relay_core::traits::Credentials;
use relay_core::types::ExchangeId;
use relay_telemetry::masking::SensitiveDataMasker;
use relay_telemetry::spans::rest_span;
use reqwest::{Client, header};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, warn};

use super::cache::{CacheKey, ResponseCache};
use super::config::RestConfig;
use super::rate_limiter::RateLimiter;
use super::signer::{build_query_string, sign_request, timestamp_ms};

/// Return code Bybit uses for "too many visits".
const RET_CODE_RATE_LIMITED: i64 = 10006;

/// Whether an endpoint needs signed credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// No authentication headers are attached.
    Public,
    /// The request is signed with the exchange's credentials.
    Private,
}

/// A fully prepared GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL including the query string.
    pub url: String,
    /// Extra headers (authentication).
    pub headers: Vec<(String, String)>,
    /// Request timeout.
    pub timeout: Duration,
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport used by the gateway.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes a GET request.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given user agent.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be created.
    pub fn new(user_agent: &str) -> Result<Self, NetworkError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            user_agent
                .parse()
                .map_err(|_| NetworkError::ConnectionFailed {
                    reason: "Invalid user agent".to_string(),
                })?,
        );

        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::ConnectionFailed {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
        let mut builder = self
            .http_client
            .get(&request.url)
            .timeout(request.timeout);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout { timeout_ms }
            } else if e.is_connect() {
                NetworkError::ConnectionFailed {
                    reason: e.to_string(),
                }
            } else {
                NetworkError::Http {
                    status_code: e.status().map_or(0, |s| s.as_u16()),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| NetworkError::Http {
            status_code: status,
            reason: format!("Failed to read response: {e}"),
        })?;

        Ok(HttpResponse { status, body })
    }
}

#[derive(Clone)]
struct Route {
    config: RestConfig,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    credentials: Option<Credentials>,
    /// Bumped on every credential change.
    generation: u64,
}

/// REST gateway shared by every exchange adapter.
///
/// Each registered exchange gets its own rate-limit window and response
/// cache. Requests run in this order:
///
/// 1. A cached response younger than the TTL is returned immediately.
/// 2. Private requests without credentials fail with
///    `ExchangeError::AuthenticationFailed`.
/// 3. The rate limiter is acquired; a full window waits rather than fails.
/// 4. Private requests are signed.
/// 5. The response status and `retCode` envelope are checked and the
///    payload is cached.
pub struct RestGateway {
    transport: Arc<dyn HttpTransport>,
    routes: RwLock<HashMap<ExchangeId, Route>>,
    masker: SensitiveDataMasker,
}

impl RestGateway {
    /// Creates a gateway over `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            routes: RwLock::new(HashMap::new()),
            masker: SensitiveDataMasker::new(),
        }
    }

    /// Creates a gateway backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be created.
    pub fn with_reqwest() -> Result<Self, NetworkError> {
        let transport = ReqwestTransport::new(&RestConfig::default().user_agent)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Registers (or replaces) the route for `exchange`.
    ///
    /// Replacing a route resets its rate-limit window and cache but keeps
    /// any credentials already set.
    pub fn register_exchange(&self, exchange: ExchangeId, config: RestConfig) {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
        ));
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));

        let mut routes = self.routes.write();
        let (credentials, generation) = routes
            .get(&exchange)
            .map_or((None, 0), |r| (r.credentials.clone(), r.generation));
        debug!(exchange = %exchange, base_url = %config.base_url, "Registered REST route");
        routes.insert(
            exchange,
            Route {
                config,
                limiter,
                cache,
                credentials,
                generation,
            },
        );
    }

    /// Sets or clears the credentials used for private requests.
    ///
    /// Cached responses for the exchange are dropped, and responses to
    /// requests still in flight under the old credentials are not cached.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Unsupported` if no route is registered.
    pub fn set_credentials(
        &self,
        exchange: &ExchangeId,
        credentials: Option<Credentials>,
    ) -> Result<(), ExchangeError> {
        let mut routes = self.routes.write();
        let route = routes
            .get_mut(exchange)
            .ok_or_else(|| unregistered(exchange))?;
        route.credentials = credentials;
        route.generation += 1;
        route.cache.clear();
        Ok(())
    }

    /// Returns true if credentials are set for `exchange`.
    #[must_use]
    pub fn has_credentials(&self, exchange: &ExchangeId) -> bool {
        self.routes
            .read()
            .get(exchange)
            .is_some_and(|r| r.credentials.is_some())
    }

    /// Performs a GET request against `exchange`.
    ///
    /// # Errors
    ///
    /// - `ExchangeError::AuthenticationFailed` for a private request without
    ///   credentials, or on HTTP 401/403
    /// - `ExchangeError::RateLimited` on HTTP 429 or the exchange's
    ///   rate-limit return code
    /// - `ExchangeError::Api` when the envelope's `retCode` is non-zero
    /// - `ExchangeError::InvalidResponse` when the body is not JSON
    /// - `NetworkError` for transport failures and other HTTP errors
    pub async fn request(
        &self,
        exchange: &ExchangeId,
        endpoint: &str,
        params: &[(String, String)],
        auth: Auth,
    ) -> Result<Value, RelayError> {
        let route = self
            .routes
            .read()
            .get(exchange)
            .cloned()
            .ok_or_else(|| unregistered(exchange))?;

        let span = rest_span(exchange.as_str(), endpoint);
        let key = CacheKey::new(exchange.as_str(), endpoint, params);
        if let Some(payload) = route.cache.get(&key) {
            span.record("cached", true);
            debug!(parent: &span, "Serving cached response");
            return Ok(payload);
        }
        span.record("cached", false);

        let payload = self
            .fetch(&route, endpoint, params, auth)
            .instrument(span)
            .await?;
        self.cache_if_current(exchange, route.generation, &route.cache, key, &payload);
        Ok(payload)
    }

    /// Caches `payload` unless the credentials changed while it was in flight.
    fn cache_if_current(
        &self,
        exchange: &ExchangeId,
        generation: u64,
        cache: &ResponseCache,
        key: CacheKey,
        payload: &Value,
    ) {
        let routes = self.routes.read();
        if routes.get(exchange).is_some_and(|r| r.generation == generation) {
            cache.insert(key, payload.clone());
        } else {
            debug!(exchange = %exchange, "Credentials changed mid-request, response not cached");
        }
    }

    async fn fetch(
        &self,
        route: &Route,
        endpoint: &str,
        params: &[(String, String)],
        auth: Auth,
    ) -> Result<Value, RelayError> {
        let credentials = match auth {
            Auth::Public => None,
            Auth::Private => Some(route.credentials.as_ref().ok_or_else(|| {
                ExchangeError::AuthenticationFailed {
                    reason: format!("{endpoint} requires API credentials"),
                }
            })?),
        };

        route.limiter.acquire().await;

        let query = build_query_string(params);
        let headers = match credentials {
            Some(credentials) => sign_request(
                credentials,
                timestamp_ms(),
                route.config.recv_window_ms,
                &query,
            )?
            .header_pairs(),
            None => Vec::new(),
        };

        let base = route.config.build_url(endpoint);
        let url = if query.is_empty() {
            base
        } else {
            format!("{base}?{query}")
        };

        debug!(url = %url, signed = credentials.is_some(), "Sending request");
        let response = self
            .transport
            .get(HttpRequest {
                url,
                headers,
                timeout: route.config.timeout(),
            })
            .await?;

        self.check_response(route, endpoint, &response)
    }

    fn check_response(
        &self,
        route: &Route,
        endpoint: &str,
        response: &HttpResponse,
    ) -> Result<Value, RelayError> {
        let retry_after_ms = route.config.rate_limit_window_ms;

        match response.status {
            401 | 403 => {
                let body = self.masker.mask_string(&response.body);
                warn!(status = response.status, body = %body, "Authentication rejected");
                return Err(ExchangeError::AuthenticationFailed {
                    reason: format!("HTTP {}", response.status),
                }
                .into());
            }
            429 => {
                warn!("Rate limited by exchange");
                return Err(ExchangeError::RateLimited { retry_after_ms }.into());
            }
            _ if !response.is_success() => {
                return Err(NetworkError::Http {
                    status_code: response.status,
                    reason: self.masker.mask_string(&response.body).into_owned(),
                }
                .into());
            }
            _ => {}
        }

        let payload: Value =
            serde_json::from_str(&response.body).map_err(|e| ExchangeError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let code = payload.get("retCode").and_then(Value::as_i64).unwrap_or(0);
        if code == RET_CODE_RATE_LIMITED {
            warn!(code, "Rate limited by exchange");
            return Err(ExchangeError::RateLimited { retry_after_ms }.into());
        }
        if code != 0 {
            let message = payload
                .get("retMsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            warn!(code, message = %message, "Exchange returned an error");
            return Err(ExchangeError::Api { code, message }.into());
        }

        Ok(payload)
    }

    /// Drops every cached response.
    pub fn clear_cache(&self) {
        for route in self.routes.read().values() {
            route.cache.clear();
        }
    }

    /// Number of cached responses across all exchanges.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.routes.read().values().map(|r| r.cache.len()).sum()
    }

    /// Returns the rate limiter for `exchange`.
    #[must_use]
    pub fn rate_limiter(&self, exchange: &ExchangeId) -> Option<Arc<RateLimiter>> {
        self.routes.read().get(exchange).map(|r| r.limiter.clone())
    }

    /// Returns the route configuration for `exchange`.
    #[must_use]
    pub fn config(&self, exchange: &ExchangeId) -> Option<RestConfig> {
        self.routes.read().get(exchange).map(|r| r.config.clone())
    }
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self.routes.read().keys().map(ToString::to_string).collect();
        f.debug_struct("RestGateway")
            .field("routes", &routes)
            .finish_non_exhaustive()
    }
}

fn unregistered(exchange: &ExchangeId) -> ExchangeError {
    ExchangeError::Unsupported {
        exchange: exchange.to_string(),
        operation: "REST request (no route registered)".to_string(),
    }
}
