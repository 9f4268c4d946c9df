use chrono::{DateTime, TimeZone, Utc};

use crate::error::OhlcvError;
use crate::kline::{Candle, RawKline};

/// Convert a raw kline series into normalized candles: epoch-millisecond
/// timestamps become `DateTime<Utc>` and the eight string-encoded numeric
/// fields become `f64`. The input is borrowed and never mutated; the
/// returned series is an independent copy.
///
/// Malformed numeric text or an unrepresentable timestamp is fatal and
/// surfaces as a conversion error naming the row and field.
pub fn normalize(raw: &[RawKline]) -> Result<Vec<Candle>, OhlcvError> {
    let mut candles = Vec::with_capacity(raw.len());

    for (row, k) in raw.iter().enumerate() {
        candles.push(Candle {
            open_time: millis_to_utc(row, "open_time", k.open_time)?,
            open: parse_numeric(row, "open", &k.open)?,
            high: parse_numeric(row, "high", &k.high)?,
            low: parse_numeric(row, "low", &k.low)?,
            close: parse_numeric(row, "close", &k.close)?,
            volume: parse_numeric(row, "volume", &k.volume)?,
            close_time: millis_to_utc(row, "close_time", k.close_time)?,
            quote_asset_volume: parse_numeric(row, "quote_asset_volume", &k.quote_asset_volume)?,
            number_of_trades: k.number_of_trades,
            taker_buy_base_volume: parse_numeric(
                row,
                "taker_buy_base_volume",
                &k.taker_buy_base_volume,
            )?,
            taker_buy_quote_volume: parse_numeric(
                row,
                "taker_buy_quote_volume",
                &k.taker_buy_quote_volume,
            )?,
            ignore: k.ignore.clone(),
        });
    }

    Ok(candles)
}

fn parse_numeric(row: usize, field: &'static str, value: &str) -> Result<f64, OhlcvError> {
    value.parse().map_err(|_| OhlcvError::Conversion {
        row,
        field,
        value: value.to_string(),
    })
}

fn millis_to_utc(row: usize, field: &'static str, ms: i64) -> Result<DateTime<Utc>, OhlcvError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| OhlcvError::Conversion {
            row,
            field,
            value: ms.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(open_time: i64, open: &str, high: &str, low: &str, close: &str) -> RawKline {
        RawKline {
            open_time,
            open: open.to_string(),
            high: high.to_string(),
            low: low.to_string(),
            close: close.to_string(),
            volume: "1234.5".to_string(),
            close_time: open_time + 14_399_999,
            quote_asset_volume: "9000.25".to_string(),
            number_of_trades: 42,
            taker_buy_base_volume: "600.1".to_string(),
            taker_buy_quote_volume: "4500.75".to_string(),
            ignore: "0".to_string(),
        }
    }

    #[test]
    fn converts_timestamps_and_numerics() {
        // 2019-01-01T00:00:00Z
        let input = vec![raw(1_546_300_800_000, "3701.23", "3750.00", "3690.10", "3742.85")];
        let candles = normalize(&input).unwrap();

        assert_eq!(candles.len(), 1);
        let c = &candles[0];
        assert_eq!(c.open_time, Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            c.close_time,
            Utc.with_ymd_and_hms(2019, 1, 1, 3, 59, 59).unwrap() + chrono::Duration::milliseconds(999)
        );
        assert!((c.open - 3701.23).abs() < 1e-9);
        assert!((c.high - 3750.0).abs() < 1e-9);
        assert!((c.low - 3690.1).abs() < 1e-9);
        assert!((c.close - 3742.85).abs() < 1e-9);
        assert!((c.volume - 1234.5).abs() < 1e-9);
        assert!((c.quote_asset_volume - 9000.25).abs() < 1e-9);
        assert_eq!(c.number_of_trades, 42);
        assert_eq!(c.ignore, "0");
    }

    #[test]
    fn does_not_mutate_input() {
        let input = vec![
            raw(1_546_300_800_000, "100", "110", "90", "105"),
            raw(1_546_315_200_000, "105", "120", "100", "115"),
        ];
        let before = input.clone();

        normalize(&input).unwrap();

        assert_eq!(input, before);
    }

    #[test]
    fn malformed_numeric_is_fatal() {
        let mut bad = raw(1_546_300_800_000, "100", "110", "90", "105");
        bad.high = "not-a-number".to_string();

        let err = normalize(&[bad]).unwrap_err();
        match err {
            OhlcvError::Conversion { row, field, value } => {
                assert_eq!(row, 0);
                assert_eq!(field, "high");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected Conversion error, got {other:?}"),
        }
    }

    #[test]
    fn error_names_offending_row() {
        let good = raw(1_546_300_800_000, "100", "110", "90", "105");
        let mut bad = raw(1_546_315_200_000, "100", "110", "90", "105");
        bad.volume = String::new();

        let err = normalize(&[good, bad]).unwrap_err();
        match err {
            OhlcvError::Conversion { row, field, .. } => {
                assert_eq!(row, 1);
                assert_eq!(field, "volume");
            }
            other => panic!("expected Conversion error, got {other:?}"),
        }
    }

    #[test]
    fn nan_text_parses_through() {
        // A textual NaN is a valid f64 parse; the validator rejects it later.
        let mut k = raw(1_546_300_800_000, "100", "110", "90", "105");
        k.open = "NaN".to_string();

        let candles = normalize(&[k]).unwrap();
        assert!(candles[0].open.is_nan());
    }

    #[test]
    fn empty_series() {
        assert!(normalize(&[]).unwrap().is_empty());
    }
}
