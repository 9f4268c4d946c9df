use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the persisted table, matching Binance's kline array
/// layout. The trailing `ignore` field is carried through verbatim.
pub const COLUMNS: [&str; 12] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
    "quote_asset_volume",
    "number_of_trades",
    "taker_buy_base_volume",
    "taker_buy_quote_volume",
    "ignore",
];

/// One kline exactly as the provider returns it: epoch-millisecond
/// timestamps and string-encoded numeric fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
    pub quote_asset_volume: String,
    pub number_of_trades: i64,
    pub taker_buy_base_volume: String,
    pub taker_buy_quote_volume: String,
    pub ignore: String,
}

/// A normalized OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
    pub quote_asset_volume: f64,
    pub number_of_trades: i64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
    pub ignore: String,
}

/// Kline bucket sizes the fetcher supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    /// The provider's interval token for this bucket size.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_tokens() {
        assert_eq!(Interval::OneMinute.as_str(), "1m");
        assert_eq!(Interval::FourHours.as_str(), "4h");
        assert_eq!(Interval::OneDay.as_str(), "1d");
    }

    #[test]
    fn interval_display_matches_token() {
        assert_eq!(Interval::FourHours.to_string(), "4h");
    }

    #[test]
    fn column_order() {
        assert_eq!(COLUMNS.len(), 12);
        assert_eq!(COLUMNS[0], "open_time");
        assert_eq!(COLUMNS[6], "close_time");
        assert_eq!(COLUMNS[11], "ignore");
    }
}
