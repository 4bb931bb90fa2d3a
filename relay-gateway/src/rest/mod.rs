//! REST gateway infrastructure.
//!
//! This module provides:
//! - Request signing (HMAC-SHA256 over timestamp, key, receive window and query)
//! - A per-exchange sliding-window rate limiter that waits instead of failing
//! - A short-lived response cache keyed by exchange, endpoint and sorted params
//! - [`RestGateway`], which combines them over an [`HttpTransport`]
//!
//! # Example
//!
//! ```ignore
//! use relay_gateway::rest::{Auth, RestConfig, RestGateway};
//!
//! let gateway = RestGateway::with_reqwest()?;
//! gateway.register_exchange(
//!     ExchangeId::bybit(),
//!     RestConfig::builder().base_url("https://api.bybit.com").build(),
//! );
//! let payload = gateway
//!     .request(&ExchangeId::bybit(), "/v5/market/kline", &params, Auth::Public)
//!     .await?;
//! ```

mod cache;
mod client;
mod config;
mod rate_limiter;
mod signer;

pub use cache::{CacheKey, ResponseCache};
pub use client::{Auth, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RestGateway};
pub use config::{RestConfig, RestConfigBuilder};
pub use rate_limiter::RateLimiter;
pub use signer::{
    HEADER_API_KEY, HEADER_RECV_WINDOW, HEADER_SIGN, HEADER_TIMESTAMP, RequestSigner,
    SignedHeaders, build_query_string, sign_request, timestamp_ms,
};
