//! Capability traits and the contracts between relay components.
//!
//! # Modules
//!
//! - credentials - API key/secret pair
//! - handler - Consumer handlers and subscription handles
//! - stream - Seams between the stream connection and the broker
//! - normalizer - Exchange payload to canonical record conversion
//! - exchange - Per-exchange capability contract
//!
//! ```ignore
//! use relay_core::traits::*;
//!
//! let handle = exchange.subscribe_trades(&symbol, handler_fn(|topic, event| {
//!     println!("{topic}: {event:?}");
//!     Ok(())
//! }))?;
//! // ...
//! handle.unsubscribe();
//! ```

mod credentials;
mod exchange;
mod handler;
mod normalizer;
mod stream;

pub use credentials::Credentials;
pub use exchange::Exchange;
pub use handler::{ConsumerId, EventHandler, HandlerError, SubscriptionHandle, handler_fn};
pub use normalizer::Normalizer;
pub use stream::{RawFrame, StreamObserver, StreamSink, SubscriptionAck, SubscriptionOp};
