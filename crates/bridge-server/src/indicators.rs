//! Indicators shipped with the host binary.

use bridge_core::{Candle, MarketDirection};

use crate::api::Indicator;

/// Direction of the candle body: up when it closed above its open, down
/// when below, unknown for a doji.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandleBodyTrend;

impl Indicator for CandleBodyTrend {
    fn indicate(&mut self, candle: &Candle) -> Option<MarketDirection> {
        if candle.close > candle.open {
            Some(MarketDirection::Up)
        } else if candle.close < candle.open {
            Some(MarketDirection::Down)
        } else {
            None
        }
    }
}
