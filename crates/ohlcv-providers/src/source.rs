use async_trait::async_trait;
use chrono::NaiveDate;
use ohlcv_core::kline::{Interval, RawKline};

use crate::error::ProviderError;

/// Trait for fetching historical kline data from an external source.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// Source name (for logging/display).
    fn name(&self) -> &str;

    /// Fetch raw klines for a symbol over an inclusive date range (UTC day
    /// boundaries). Records keep the source's native field encodings and
    /// whatever ordering the source returned.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawKline>, ProviderError>;
}
