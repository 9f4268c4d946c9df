//! Kline sources: the [`source::KlineSource`] trait and the Binance
//! implementation that backs it.

pub mod binance;
pub mod error;
pub mod source;
