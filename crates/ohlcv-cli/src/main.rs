use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use ohlcv_core::kline::Interval;
use ohlcv_core::{normalize, schema, validate};
use ohlcv_providers::binance::BinanceSource;
use ohlcv_providers::source::KlineSource;
use tracing::info;

const SYMBOL: &str = "BTCUSDT";
const INTERVAL: Interval = Interval::FourHours;
const START_DATE: &str = "2019-01-01";
const OUTPUT_PATH: &str = "data/raw/btcusdt_4h_2019_present.csv";

/// Fetch, normalize, validate, and persist one symbol's kline history.
/// Any stage failure aborts the run; nothing is written unless the series
/// passes validation.
async fn run(
    source: &dyn KlineSource,
    symbol: &str,
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
) -> Result<()> {
    info!(
        "fetching {symbol} {interval} klines from {start} to {end} via {}",
        source.name()
    );
    let raw = source
        .fetch_klines(symbol, interval, start, end)
        .await
        .with_context(|| format!("failed to fetch {symbol} klines"))?;
    info!("fetched {} kline(s)", raw.len());

    let candles = normalize::normalize(&raw).context("failed to normalize klines")?;
    validate::validate(&candles).context("integrity check failed")?;

    schema::write_csv(output, &candles)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {} candle(s) to {}", candles.len(), output.display());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let start =
        NaiveDate::parse_from_str(START_DATE, "%Y-%m-%d").context("invalid start date")?;
    // "today" is resolved here, not inside the pipeline, so tests can pass
    // a fixed end date.
    let end = Utc::now().date_naive();

    let source = BinanceSource::new();
    run(&source, SYMBOL, INTERVAL, start, end, Path::new(OUTPUT_PATH)).await
}
