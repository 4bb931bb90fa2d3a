//! Span constructors for the relay's units of work.

use tracing::{Span, info_span, trace_span};

/// Create a span covering one stream connection's lifetime.
///
/// # Example
///
/// ```
/// use relay_telemetry::spans::stream_span;
///
/// let span = stream_span("bybit");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn stream_span(exchange: &str) -> Span {
    info_span!(
        "stream",
        exchange = %exchange,
        epoch = tracing::field::Empty,
        otel.kind = "client"
    )
}

/// Create a span for one REST request.
#[must_use]
pub fn rest_span(exchange: &str, endpoint: &str) -> Span {
    info_span!(
        "rest",
        exchange = %exchange,
        endpoint = %endpoint,
        cached = tracing::field::Empty,
        otel.kind = "client"
    )
}

/// Create a span for fanning one frame out to a topic's consumers.
///
/// Trace level: this runs once per inbound market data frame.
#[must_use]
pub fn dispatch_span(topic: &str) -> Span {
    trace_span!("dispatch", topic = %topic, consumers = tracing::field::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    fn init_test_subscriber() {
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    }

    #[test]
    fn test_stream_span_records_epoch() {
        init_test_subscriber();
        let span = stream_span("bybit");
        span.record("epoch", 3_u64);
        let _guard = span.enter();
    }

    #[test]
    fn test_rest_span() {
        init_test_subscriber();
        let span = rest_span("bybit", "/v5/market/kline");
        span.record("cached", true);
        let _guard = span.enter();
    }

    #[test]
    fn test_dispatch_span() {
        init_test_subscriber();
        let span = dispatch_span("bybit:trades:BTCUSDT");
        let _guard = span.enter();
    }
}
