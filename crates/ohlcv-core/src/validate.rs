use crate::error::OhlcvError;
use crate::kline::Candle;

/// Integrity checks on a normalized series, in order of precedence:
/// completeness, chronological order, OHLC consistency. Each check scans
/// the whole series and reports the first offending row; a single bad
/// record fails the run.
pub fn validate(candles: &[Candle]) -> Result<(), OhlcvError> {
    check_completeness(candles)?;
    check_chronology(candles)?;
    check_ohlc(candles)?;
    Ok(())
}

/// No numeric field may be NaN. Timestamps and trade counts cannot be
/// absent once normalization has succeeded, so the scan covers the eight
/// float fields.
fn check_completeness(candles: &[Candle]) -> Result<(), OhlcvError> {
    for (row, c) in candles.iter().enumerate() {
        let fields = [
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume,
            c.quote_asset_volume,
            c.taker_buy_base_volume,
            c.taker_buy_quote_volume,
        ];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(OhlcvError::MissingValues { row });
        }
    }
    Ok(())
}

/// `open_time` must be non-decreasing; equal adjacent timestamps pass.
fn check_chronology(candles: &[Candle]) -> Result<(), OhlcvError> {
    for row in 1..candles.len() {
        if candles[row].open_time < candles[row - 1].open_time {
            return Err(OhlcvError::OutOfOrderTimestamps { row });
        }
    }
    Ok(())
}

/// High must be the maximum of the four prices and low the minimum.
fn check_ohlc(candles: &[Candle]) -> Result<(), OhlcvError> {
    for (row, c) in candles.iter().enumerate() {
        let invalid = c.high < c.low
            || c.high < c.open
            || c.high < c.close
            || c.low > c.open
            || c.low > c.close;
        if invalid {
            return Err(OhlcvError::InvalidOhlc { row });
        }
    }
    Ok(())
}
