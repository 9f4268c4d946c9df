use std::future::Future;

use async_trait::async_trait;
use chrono::NaiveDate;
use ohlcv_core::kline::{Interval, RawKline};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::source::KlineSource;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Hard cap the klines endpoint places on a single response.
const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Binance spot market data source.
/// No authentication required for historical kline data.
pub struct BinanceSource {
    client: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BINANCE_API_URL.to_string(),
        }
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<RawKline>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/klines", self.base_url))
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.as_str().to_string()),
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", MAX_KLINES_PER_REQUEST.to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: body,
            });
        }

        let rows: Vec<KlineRow> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse response: {e}")))?;

        Ok(rows.into_iter().map(RawKline::from).collect())
    }
}

impl Default for BinanceSource {
    fn default() -> Self {
        Self::new()
    }
}

/// One element of the klines response: a twelve-field JSON array mixing
/// integer timestamps with string-encoded numerics.
#[derive(Debug, Deserialize)]
struct KlineRow(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

impl From<KlineRow> for RawKline {
    fn from(row: KlineRow) -> Self {
        RawKline {
            open_time: row.0,
            open: row.1,
            high: row.2,
            low: row.3,
            close: row.4,
            volume: row.5,
            close_time: row.6,
            quote_asset_volume: row.7,
            number_of_trades: row.8,
            taker_buy_base_volume: row.9,
            taker_buy_quote_volume: row.10,
            ignore: row.11,
        }
    }
}

/// Page forward through a klines endpoint. A full page means more data may
/// remain, so the cursor advances to one past the last returned close time;
/// a short page, or a cursor at or beyond `end_ms`, ends the scan. Pages
/// are concatenated in fetch order.
async fn paginate<F, Fut>(
    mut fetch_page: F,
    mut start_ms: i64,
    end_ms: i64,
    page_limit: usize,
) -> Result<Vec<RawKline>, ProviderError>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<Vec<RawKline>, ProviderError>>,
{
    let mut all = Vec::new();

    loop {
        let page = fetch_page(start_ms).await?;
        debug!("fetched {} kline(s) starting at {start_ms}", page.len());

        let short_page = page.len() < page_limit;
        all.extend(page);

        if short_page {
            break;
        }
        match all.last() {
            Some(last) if last.close_time + 1 < end_ms => start_ms = last.close_time + 1,
            _ => break,
        }
    }

    Ok(all)
}

#[async_trait]
impl KlineSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    /// Fetch klines for the inclusive date range, paging forward from the
    /// last returned close time until the range is exhausted. Records are
    /// returned in the order the API produced them.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawKline>, ProviderError> {
        let start_ms = start
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let end_ms = end
            .succ_opt()
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
            - 1;

        paginate(
            |cursor| self.fetch_page(symbol, interval, cursor, end_ms),
            start_ms,
            end_ms,
            MAX_KLINES_PER_REQUEST,
        )
        .await
    }
}
