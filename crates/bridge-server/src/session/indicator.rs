//! Indicator sessions: one trend answer per candle, no turn markers.

use bridge_core::{Candle, Message};
use bridge_protocol::{read_expected, write_message, ProtocolViolation, Transport};
use tracing::{info, trace};

use crate::api::IndicatorFactory;
use crate::error::SessionError;

/// Serve the indicator registered under `number` until the connection
/// fails. Only basic candles are accepted.
pub fn run_indicator<T: Transport + ?Sized>(
    transport: &mut T,
    number: i32,
    indicators: &dyn IndicatorFactory,
) -> SessionError {
    let Some(mut indicator) = indicators.indicator(number) else {
        return ProtocolViolation::UnknownAlgorithm {
            algorithm: "indicator",
            number,
        }
        .into();
    };
    info!("serving indicator {}", number);

    loop {
        let candle: Candle = match read_expected(&mut *transport) {
            Ok(candle) => candle,
            Err(err) => return err.into(),
        };

        let trend = indicator.indicate(&candle);
        trace!(time = %candle.time, ?trend, "indicated");

        if let Err(err) = write_message(&mut *transport, &Message::TrendResult(trend)) {
            return err.into();
        }
    }
}
