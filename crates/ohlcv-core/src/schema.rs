use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::OhlcvError;
use crate::kline::{COLUMNS, Candle};

/// Render format for the timestamp columns. `%.f` keeps the sub-second
/// fraction when one is present (kline close times end on .999) and prints
/// nothing for whole seconds; on parse it also accepts an absent fraction.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Write a candle series as a CSV table: header row with the twelve column
/// names, one data row per candle, no index column.
///
/// The parent directory must already exist. The write goes to a temporary
/// file beside the destination and is renamed into place on success, so a
/// failed write never leaves a partial file; an existing file at `path` is
/// replaced.
pub fn write_csv(path: &Path, candles: &[Candle]) -> Result<(), OhlcvError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;

    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        writer.write_record(COLUMNS)?;
        for c in candles {
            writer.write_record([
                c.open_time.format(TIMESTAMP_FORMAT).to_string(),
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
                c.close_time.format(TIMESTAMP_FORMAT).to_string(),
                c.quote_asset_volume.to_string(),
                c.number_of_trades.to_string(),
                c.taker_buy_base_volume.to_string(),
                c.taker_buy_quote_volume.to_string(),
                c.ignore.clone(),
            ])?;
        }
        writer.flush()?;
    }

    tmp.persist(path)?;
    Ok(())
}

/// Read a candle series back from a CSV file written by [`write_csv`].
/// Rejects a file whose header does not match the table schema.
pub fn read_csv(path: &Path) -> Result<Vec<Candle>, OhlcvError> {
    let mut reader = csv::Reader::from_path(path)?;

    let header = reader.headers()?.clone();
    if header.iter().ne(COLUMNS) {
        return Err(OhlcvError::InvalidData(format!(
            "unexpected CSV header: {header:?}"
        )));
    }

    let mut candles = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // A ragged row surfaces as a CSV error before this point; the
        // header check above pins the record width to twelve fields.
        let record = record?;

        candles.push(Candle {
            open_time: parse_timestamp(row, "open_time", &record[0])?,
            open: parse_field(row, "open", &record[1])?,
            high: parse_field(row, "high", &record[2])?,
            low: parse_field(row, "low", &record[3])?,
            close: parse_field(row, "close", &record[4])?,
            volume: parse_field(row, "volume", &record[5])?,
            close_time: parse_timestamp(row, "close_time", &record[6])?,
            quote_asset_volume: parse_field(row, "quote_asset_volume", &record[7])?,
            number_of_trades: parse_field(row, "number_of_trades", &record[8])?,
            taker_buy_base_volume: parse_field(row, "taker_buy_base_volume", &record[9])?,
            taker_buy_quote_volume: parse_field(row, "taker_buy_quote_volume", &record[10])?,
            ignore: record[11].to_string(),
        });
    }

    Ok(candles)
}

fn parse_timestamp(row: usize, field: &'static str, value: &str) -> Result<DateTime<Utc>, OhlcvError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| OhlcvError::Conversion {
            row,
            field,
            value: value.to_string(),
        })
}

fn parse_field<T: std::str::FromStr>(
    row: usize,
    field: &'static str,
    value: &str,
) -> Result<T, OhlcvError> {
    value.parse().map_err(|_| OhlcvError::Conversion {
        row,
        field,
        value: value.to_string(),
    })
}
