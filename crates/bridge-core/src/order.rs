//! Pending orders as the host asks the terminal to place them.
//!
//! A pending order is only a request; once the terminal accepts it the
//! order is known to both sides by the [`OrderId`] the terminal assigns.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::price::Price;
use crate::volume::Volume;

/// Identifier assigned by the terminal when it accepts a placement.
///
/// Unique among the currently open orders of one connection only; the
/// terminal may hand out the same value again once the order is gone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub i32);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Buy or sell. The discriminant is the wire bit.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderType {
    Buy = 0,
    Sell = 1,
}

/// When the terminal should open the position.
///
/// The discriminant is the two-bit wire value.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionCondition {
    /// Open immediately at market.
    Direct = 0,
    Limit = 1,
    Stop = 2,
}

impl ExecutionCondition {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ExecutionCondition::Direct),
            1 => Some(ExecutionCondition::Limit),
            2 => Some(ExecutionCondition::Stop),
            _ => None,
        }
    }
}

/// Take-profit / stop-loss levels and an optional expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseConditions {
    pub take_profit: Price,
    pub stop_loss: Price,
    pub expiry: Option<DateTime<Utc>>,
}

impl CloseConditions {
    pub fn new(take_profit: Price, stop_loss: Price) -> Self {
        CloseConditions {
            take_profit,
            stop_loss,
            expiry: None,
        }
    }

    pub fn expiring_at(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// An order the host wants the terminal to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub order_type: OrderType,
    pub condition: ExecutionCondition,
    pub volume: Volume,
    pub entry_price: Price,
    pub close_conditions: CloseConditions,
}
