//! Routing of inbound terminal messages inside an expert advisor session.

use bridge_core::{Message, Money, OrderEvent};
use bridge_protocol::{MessageKind, ProtocolViolation, Transport};
use tracing::{debug, trace, warn};

use crate::api::{CapacityLease, ExpertAdvisor};
use crate::error::SessionError;
use crate::session::correlation::CorrelationTable;
use crate::session::gateway::RemoteBroker;

/// Everything one turn may touch, borrowed from the session.
pub struct TurnContext<'a, T: ?Sized> {
    pub transport: &'a mut T,
    pub orders: &'a mut CorrelationTable,
    pub advisor: &'a mut dyn ExpertAdvisor,
    pub capacity: &'a mut dyn CapacityLease,
    pub account_currency: &'a str,
}

/// Handle one inbound message. The caller writes the turn-complete marker
/// once this returns `Ok`.
///
/// For a candle, the first error any broker call raised wins over the
/// advisor's own result.
pub fn dispatch<T: Transport + ?Sized>(
    message: Message,
    turn: TurnContext<'_, T>,
) -> Result<(), SessionError> {
    trace!(kind = %MessageKind::of(&message), "dispatching");

    match message {
        Message::MarketDataExtended(candle) => {
            let mut broker = RemoteBroker::new(turn.transport, turn.orders);
            let outcome = turn.advisor.on_candle(&candle, &mut broker, turn.capacity);

            // A broker failure ends the turn even if the advisor swallowed it.
            match broker.into_failure() {
                Some(failure) => {
                    if outcome.is_ok() {
                        warn!("expert advisor ignored a broker failure: {}", failure);
                    }
                    Err(failure)
                }
                None => outcome,
            }
        }

        Message::BalanceChanged(minor_units) => {
            let balance = Money::new(minor_units, turn.account_currency);
            debug!("balance changed to {}", balance);
            turn.capacity.balance_changed(balance);
            Ok(())
        }

        Message::ExchangeRateChanged(rate) => {
            debug!("account exchange rate changed to {}", rate);
            turn.capacity.exchange_rate_changed(rate);
            Ok(())
        }

        Message::OrderFilled(event) => order_filled(event, turn.orders),

        Message::OrderClosed(event) => order_closed(event, turn.orders),

        other => Err(ProtocolViolation::NotExpected {
            kind: MessageKind::of(&other),
            context: "by the expert advisor protocol",
        }
        .into()),
    }
}

fn order_filled(event: OrderEvent, orders: &mut CorrelationTable) -> Result<(), SessionError> {
    if !orders.has(event.id) {
        return Err(ProtocolViolation::UnknownOrder {
            id: event.id,
            event: "executed",
        }
        .into());
    }

    debug!("order {} executed at {} ({})", event.id, event.price, event.time);
    orders.get(event.id)?.order_opened(event.time, event.price);
    Ok(())
}

fn order_closed(event: OrderEvent, orders: &mut CorrelationTable) -> Result<(), SessionError> {
    if !orders.has(event.id) {
        return Err(ProtocolViolation::UnknownOrder {
            id: event.id,
            event: "closed",
        }
        .into());
    }

    debug!("order {} closed at {} ({})", event.id, event.price, event.time);
    orders.get(event.id)?.order_closed(event.time, event.price);
    orders.remove(event.id)?;
    Ok(())
}
