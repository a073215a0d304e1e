//! Market data as delivered by the terminal.

use chrono::{DateTime, Utc};

use crate::price::Price;
use crate::volume::Volume;

/// One-minute OHLC candle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

/// A candle enriched with the terminal's spread, volume and tick data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullCandle {
    pub candle: Candle,

    /// Spread in pipettes.
    pub spread: Price,

    pub volume: Volume,

    pub tick_count: i32,
}

/// Trend reported by an indicator.
///
/// Wire encoding: `0 = Up`, `1 = Down`; "no trend" is encoded as `2`
/// and modelled as `None` by the callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarketDirection {
    Up,
    Down,
}
