//! Host-side contracts.
//!
//! Strategy logic, indicators and money management live outside the
//! protocol layer. The sessions only talk to them through the traits
//! below:
//! - [`ExpertAdvisor`] / [`Indicator`]: the trading algorithms
//! - [`Broker`]: what an expert advisor uses to manage orders
//! - [`OrderEventListener`]: per-order fill/close callbacks
//! - [`CapacityLease`] / [`CapacityPool`]: lent trading volume
//!
//! Algorithms are created inside the session thread, so they do not need
//! to be `Send`; the factories and the pool are shared and do.

use bridge_core::{
    Candle, CloseConditions, Failure, FullCandle, MarketDirection, Money, OrderId, PendingOrder,
    Price, TradingEnvironment, Volume,
};
use chrono::{DateTime, Utc};

use crate::error::SessionError;

/// Callbacks for one placed order.
pub trait OrderEventListener {
    /// The pending order's entry condition was met.
    fn order_opened(&mut self, time: DateTime<Utc>, price: Price);

    /// The order was closed by take-profit, stop-loss or expiry.
    fn order_closed(&mut self, time: DateTime<Utc>, price: Price);
}

/// Reference to an order the terminal accepted.
///
/// Only the broker hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHandle {
    id: OrderId,
}

impl OrderHandle {
    pub(crate) fn new(id: OrderId) -> Self {
        OrderHandle { id }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }
}

/// Result of a placement the terminal answered: a handle, or its rejection.
pub type Placement = Result<OrderHandle, Failure>;

/// Order management as seen by an expert advisor.
///
/// The outer `Result` is a session-ending error; terminal rejections are
/// ordinary values inside it. Once a call has returned an error, every
/// later call in the same turn returns it again and the session ends with
/// it, even if the advisor ignores it.
pub trait Broker {
    fn place(
        &mut self,
        order: PendingOrder,
        listener: Box<dyn OrderEventListener>,
    ) -> Result<Placement, SessionError>;

    /// Close an open order or cancel a pending one.
    ///
    /// Calling this for an order that is already closed is a bug in the
    /// caller and ends the session.
    fn close_or_cancel(&mut self, handle: &OrderHandle) -> Result<(), SessionError>;

    /// Returns the terminal's rejection, if any. A rejected change leaves
    /// the order open under its previous conditions.
    fn change_close_conditions(
        &mut self,
        handle: &OrderHandle,
        conditions: CloseConditions,
    ) -> Result<Option<Failure>, SessionError>;
}

pub trait ExpertAdvisor {
    /// React to a new candle. Any broker call happens inside the current
    /// turn, before the terminal is told the turn is complete.
    fn on_candle(
        &mut self,
        candle: &FullCandle,
        broker: &mut dyn Broker,
        capacity: &mut dyn CapacityLease,
    ) -> Result<(), SessionError>;
}

pub trait Indicator {
    fn indicate(&mut self, candle: &Candle) -> Option<MarketDirection>;
}

pub trait ExpertAdvisorFactory: Send + Sync {
    fn expert_advisor(
        &self,
        number: i32,
        environment: &TradingEnvironment,
    ) -> Option<Box<dyn ExpertAdvisor>>;
}

pub trait IndicatorFactory: Send + Sync {
    fn indicator(&self, number: i32) -> Option<Box<dyn Indicator>>;
}

/// Receives account updates pushed by the terminal.
pub trait BalanceManager {
    fn balance_changed(&mut self, balance: Money);

    fn exchange_rate_changed(&mut self, rate: Price);
}

/// Volume lent to one session by a shared money management.
pub trait CapacityLease: BalanceManager {
    /// Borrow up to `wanted`; `None` when nothing can be lent.
    fn request_volume(&mut self, wanted: Volume) -> Option<Volume>;

    /// Hand back a lot obtained from `request_volume`.
    fn return_volume(&mut self, volume: Volume);

    /// Forcefully hand back everything still lent to this session.
    fn release_all(&mut self);
}

pub trait CapacityPool: Send + Sync {
    fn lease(&self) -> Box<dyn CapacityLease>;
}
