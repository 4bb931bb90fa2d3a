//! Stream channels and candle intervals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::ValidationError;

/// Kind of market data stream a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Public trade prints.
    Trades,
    /// Order-book snapshots and deltas.
    #[serde(rename = "orderbook")]
    OrderBook,
    /// Candlesticks for a given interval.
    Candles,
}

impl Channel {
    /// Returns the lowercase channel name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::OrderBook => "orderbook",
            Self::Candles => "candles",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trades" => Ok(Self::Trades),
            "orderbook" => Ok(Self::OrderBook),
            "candles" => Ok(Self::Candles),
            other => Err(ValidationError::UnknownChannel(other.to_string())),
        }
    }
}

/// Candle interval, spelled on the wire as the exchange expects it
/// (`1`, `5`, `60`, `D`, ...).
///
/// ```
/// use relay_core::types::Interval;
///
/// let interval: Interval = "15".parse().unwrap();
/// assert_eq!(interval, Interval::Minute15);
/// assert_eq!(Interval::Day1.as_str(), "D");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    /// 1 minute
    Minute1,
    /// 3 minutes
    Minute3,
    /// 5 minutes
    Minute5,
    /// 15 minutes
    Minute15,
    /// 30 minutes
    Minute30,
    /// 1 hour
    Hour1,
    /// 2 hours
    Hour2,
    /// 4 hours
    Hour4,
    /// 6 hours
    Hour6,
    /// 12 hours
    Hour12,
    /// 1 day
    Day1,
    /// 1 week
    Week1,
    /// 1 month
    Month1,
}

impl Interval {
    /// All supported intervals, shortest first.
    pub const ALL: [Self; 13] = [
        Self::Minute1,
        Self::Minute3,
        Self::Minute5,
        Self::Minute15,
        Self::Minute30,
        Self::Hour1,
        Self::Hour2,
        Self::Hour4,
        Self::Hour6,
        Self::Hour12,
        Self::Day1,
        Self::Week1,
        Self::Month1,
    ];

    /// Returns the wire spelling of this interval.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1",
            Self::Minute3 => "3",
            Self::Minute5 => "5",
            Self::Minute15 => "15",
            Self::Minute30 => "30",
            Self::Hour1 => "60",
            Self::Hour2 => "120",
            Self::Hour4 => "240",
            Self::Hour6 => "360",
            Self::Hour12 => "720",
            Self::Day1 => "D",
            Self::Week1 => "W",
            Self::Month1 => "M",
        }
    }

    /// Returns the nominal duration of this interval. A month counts as 30 days.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        const MIN: u64 = 60;
        match self {
            Self::Minute1 => Duration::from_secs(MIN),
            Self::Minute3 => Duration::from_secs(3 * MIN),
            Self::Minute5 => Duration::from_secs(5 * MIN),
            Self::Minute15 => Duration::from_secs(15 * MIN),
            Self::Minute30 => Duration::from_secs(30 * MIN),
            Self::Hour1 => Duration::from_secs(60 * MIN),
            Self::Hour2 => Duration::from_secs(120 * MIN),
            Self::Hour4 => Duration::from_secs(240 * MIN),
            Self::Hour6 => Duration::from_secs(360 * MIN),
            Self::Hour12 => Duration::from_secs(720 * MIN),
            Self::Day1 => Duration::from_secs(1440 * MIN),
            Self::Week1 => Duration::from_secs(7 * 1440 * MIN),
            Self::Month1 => Duration::from_secs(30 * 1440 * MIN),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownInterval(s.to_string()))
    }
}

impl TryFrom<String> for Interval {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse_every_spelling() {
        for interval in Interval::ALL {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn test_interval_unknown() {
        assert!(matches!(
            "7".parse::<Interval>(),
            Err(ValidationError::UnknownInterval(_))
        ));
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(Interval::Hour4.duration(), Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_channel_round_trip() {
        for channel in [Channel::Trades, Channel::OrderBook, Channel::Candles] {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
    }
}
