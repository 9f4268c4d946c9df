//! Core types and transformations for historical OHLCV candle data:
//! the raw provider-shaped kline record, the normalized candle, integrity
//! checks, and the CSV table schema used for persistence.

pub mod error;
pub mod kline;
pub mod normalize;
pub mod schema;
pub mod validate;
