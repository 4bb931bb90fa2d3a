//! Exchange payload normalization.

use crate::error::DataError;
use crate::events::MarketEvent;
use crate::types::Topic;

use super::RawFrame;

/// Converts an exchange-native payload into canonical events.
///
/// One frame may carry several records (a batch of trades), so the result
/// is a list in wire order. Unknown fields are ignored and missing numeric
/// fields become `0.0`.
pub trait Normalizer: Send + Sync {
    /// Normalizes `raw`, which arrived on `topic`.
    fn normalize(&self, topic: &Topic, raw: &RawFrame) -> Result<Vec<MarketEvent>, DataError>;
}
