//! Message types exchanged with the trading terminal.
//!
//! These are **transport-agnostic** logical messages. Each variant maps
//! to exactly one wire tag; the binary encoder lives in the
//! `bridge-protocol` crate and this module is purely logical.
//!
//! Direction:
//! - terminal → host: `SelectAlgorithm`, `MarketData`, `PlaceOrderResponse`,
//!   `OrderFilled`, `OrderClosed`, `MarketDataExtended`, `EnvironmentInfo`,
//!   `ChangeConditionsResponse`, `BalanceChanged`, `ExchangeRateChanged`
//! - host → terminal: `TrendResult`, `PlaceOrder`, `CloseOrCancel`,
//!   `TurnComplete`, `ChangeCloseConditions`

use chrono::{DateTime, Utc};

use crate::candle::{Candle, FullCandle, MarketDirection};
use crate::environment::TradingEnvironment;
use crate::failure::Failure;
use crate::order::{CloseConditions, OrderId, PendingOrder};
use crate::price::Price;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// First message of every connection: which algorithm to serve.
    SelectAlgorithm(SelectAlgorithm),

    /// Basic candle, consumed by indicators.
    MarketData(Candle),

    /// Indicator answer to a basic candle; `None` means no clear trend.
    TrendResult(Option<MarketDirection>),

    PlaceOrder(PendingOrder),

    PlaceOrderResponse(PlaceOrderResponse),

    /// A pending order's entry condition was met.
    OrderFilled(OrderEvent),

    /// An order was closed by its take-profit, stop-loss or expiry.
    OrderClosed(OrderEvent),

    CloseOrCancel(OrderId),

    /// Marks the end of the host's handling of one inbound message.
    TurnComplete,

    /// Candle with spread/volume/ticks, consumed by expert advisors.
    MarketDataExtended(FullCandle),

    EnvironmentInfo(TradingEnvironment),

    ChangeCloseConditions(ChangeCloseConditions),

    ChangeConditionsResponse(ChangeConditionsResponse),

    /// New account balance in minor units of the account currency.
    BalanceChanged(i64),

    /// New rate of the account-currency conversion symbol.
    ExchangeRateChanged(Price),
}

/// The kind of trading algorithm a terminal asks for.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlgorithmKind {
    ExpertAdvisor = 0,
    Indicator = 1,
}

impl AlgorithmKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(AlgorithmKind::ExpertAdvisor),
            1 => Some(AlgorithmKind::Indicator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectAlgorithm {
    pub kind: AlgorithmKind,
    /// Number of the expert advisor or indicator in the host's registry.
    pub number: i32,
}

/// Terminal answer to [`Message::PlaceOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderResponse {
    pub outcome: Result<OrderId, Failure>,
}

/// Fill or close notification for a previously placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    pub id: OrderId,
    pub time: DateTime<Utc>,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCloseConditions {
    pub id: OrderId,
    pub conditions: CloseConditions,
}

/// Terminal answer to [`Message::ChangeCloseConditions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeConditionsResponse {
    /// `None` when the new conditions were accepted.
    pub failure: Option<Failure>,
}
