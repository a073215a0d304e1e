//! Expert advisors shipped with the host binary.

use std::cell::Cell;
use std::rc::Rc;

use bridge_core::{
    CloseConditions, ExecutionCondition, FullCandle, OrderType, PendingOrder, Price,
    TradingEnvironment, Volume,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{Broker, CapacityLease, ExpertAdvisor, OrderEventListener};
use crate::error::SessionError;

const ENTRY_OFFSET: Price = Price::from_pipettes(20);
const EXIT_DISTANCE: Price = Price::from_pipettes(100);

/// Keeps one buy limit order in the market: 2 pips below the last close,
/// take profit and stop loss 10 pips away from it.
///
/// A new order goes out on the first candle after the previous one was
/// closed or rejected. Its volume is the broker's minimum, borrowed from
/// the session's capacity lease and handed back once the order is gone.
pub struct PullbackBuyer {
    lot: Volume,
    working: Rc<Cell<bool>>,
    lent: Option<Volume>,
}

impl PullbackBuyer {
    pub fn new(environment: &TradingEnvironment) -> Self {
        PullbackBuyer {
            lot: environment.volume_constraints.min,
            working: Rc::new(Cell::new(false)),
            lent: None,
        }
    }
}

struct OrderTracker {
    working: Rc<Cell<bool>>,
}

impl OrderEventListener for OrderTracker {
    fn order_opened(&mut self, time: DateTime<Utc>, price: Price) {
        debug!("pullback entry filled at {} ({})", price, time);
    }

    fn order_closed(&mut self, time: DateTime<Utc>, price: Price) {
        debug!("pullback position closed at {} ({})", price, time);
        self.working.set(false);
    }
}

impl ExpertAdvisor for PullbackBuyer {
    fn on_candle(
        &mut self,
        candle: &FullCandle,
        broker: &mut dyn Broker,
        capacity: &mut dyn CapacityLease,
    ) -> Result<(), SessionError> {
        if self.working.get() {
            return Ok(());
        }
        if let Some(lot) = self.lent.take() {
            capacity.return_volume(lot);
        }

        let Some(volume) = capacity.request_volume(self.lot) else {
            debug!("no capacity left for a pullback order");
            return Ok(());
        };

        let close = candle.candle.close;
        let order = PendingOrder {
            order_type: OrderType::Buy,
            condition: ExecutionCondition::Limit,
            volume,
            entry_price: close - ENTRY_OFFSET,
            close_conditions: CloseConditions::new(close + EXIT_DISTANCE, close - EXIT_DISTANCE),
        };
        let tracker = OrderTracker {
            working: Rc::clone(&self.working),
        };

        match broker.place(order, Box::new(tracker))? {
            Ok(handle) => {
                info!("pullback order {} placed below {}", handle.id(), close);
                self.working.set(true);
                self.lent = Some(volume);
            }
            Err(failure) => {
                debug!("pullback order rejected: {}", failure);
                capacity.return_volume(volume);
            }
        }
        Ok(())
    }
}
