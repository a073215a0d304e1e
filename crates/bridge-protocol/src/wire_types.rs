//! Low-level wire types and constants.
//!
//! This module defines:
//! - the one-byte tag of every message type,
//! - the mapping from a logical [`Message`] to its tag,
//! - the bit layout of the place-order flags byte.
//!
//! The actual encode/decode logic lives in `binary_codec`.

use std::fmt;

use bridge_core::Message;

/// Message tags.
///
/// The tag is the first byte of every message; it alone determines how
/// many primitives follow. There is no per-message length prefix.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SelectAlgorithm = 0,
    MarketData = 1,
    TrendResult = 2,
    PlaceOrder = 3,
    PlaceOrderResponse = 4,
    OrderFilled = 5,
    OrderClosed = 6,
    CloseOrCancel = 7,
    TurnComplete = 8,
    MarketDataExtended = 9,
    EnvironmentInfo = 10,
    ChangeCloseConditions = 11,
    ChangeConditionsResponse = 12,
    BalanceChanged = 13,
    ExchangeRateChanged = 14,
}

impl MessageKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(MessageKind::SelectAlgorithm),
            1 => Some(MessageKind::MarketData),
            2 => Some(MessageKind::TrendResult),
            3 => Some(MessageKind::PlaceOrder),
            4 => Some(MessageKind::PlaceOrderResponse),
            5 => Some(MessageKind::OrderFilled),
            6 => Some(MessageKind::OrderClosed),
            7 => Some(MessageKind::CloseOrCancel),
            8 => Some(MessageKind::TurnComplete),
            9 => Some(MessageKind::MarketDataExtended),
            10 => Some(MessageKind::EnvironmentInfo),
            11 => Some(MessageKind::ChangeCloseConditions),
            12 => Some(MessageKind::ChangeConditionsResponse),
            13 => Some(MessageKind::BalanceChanged),
            14 => Some(MessageKind::ExchangeRateChanged),
            _ => None,
        }
    }

    /// Tag of a logical message.
    pub fn of(message: &Message) -> Self {
        match message {
            Message::SelectAlgorithm(_) => MessageKind::SelectAlgorithm,
            Message::MarketData(_) => MessageKind::MarketData,
            Message::TrendResult(_) => MessageKind::TrendResult,
            Message::PlaceOrder(_) => MessageKind::PlaceOrder,
            Message::PlaceOrderResponse(_) => MessageKind::PlaceOrderResponse,
            Message::OrderFilled(_) => MessageKind::OrderFilled,
            Message::OrderClosed(_) => MessageKind::OrderClosed,
            Message::CloseOrCancel(_) => MessageKind::CloseOrCancel,
            Message::TurnComplete => MessageKind::TurnComplete,
            Message::MarketDataExtended(_) => MessageKind::MarketDataExtended,
            Message::EnvironmentInfo(_) => MessageKind::EnvironmentInfo,
            Message::ChangeCloseConditions(_) => MessageKind::ChangeCloseConditions,
            Message::ChangeConditionsResponse(_) => MessageKind::ChangeConditionsResponse,
            Message::BalanceChanged(_) => MessageKind::BalanceChanged,
            Message::ExchangeRateChanged(_) => MessageKind::ExchangeRateChanged,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::SelectAlgorithm => "select algorithm",
            MessageKind::MarketData => "market data",
            MessageKind::TrendResult => "trend result",
            MessageKind::PlaceOrder => "place order",
            MessageKind::PlaceOrderResponse => "place order response",
            MessageKind::OrderFilled => "order filled",
            MessageKind::OrderClosed => "order closed",
            MessageKind::CloseOrCancel => "close or cancel order",
            MessageKind::TurnComplete => "turn complete",
            MessageKind::MarketDataExtended => "extended market data",
            MessageKind::EnvironmentInfo => "environment information",
            MessageKind::ChangeCloseConditions => "change close conditions",
            MessageKind::ChangeConditionsResponse => "change close conditions response",
            MessageKind::BalanceChanged => "balance changed",
            MessageKind::ExchangeRateChanged => "exchange rate changed",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u8)
    }
}

// -----------------------------------------------------------------------------
// Place-order flags byte
// -----------------------------------------------------------------------------

/// bit 0: order type (0 = buy, 1 = sell)
pub const FLAG_ORDER_TYPE: u8 = 0b0000_0001;

/// bits 1-2: execution condition (0 = direct, 1 = limit, 2 = stop)
pub const FLAG_CONDITION_SHIFT: u8 = 1;
pub const FLAG_CONDITION_MASK: u8 = 0b0000_0110;

/// bit 3: an expiry timestamp follows the stop loss
pub const FLAG_HAS_EXPIRY: u8 = 0b0000_1000;

/// Bits 4-7 are unassigned and must be zero.
pub const FLAG_RESERVED_MASK: u8 = 0b1111_0000;

/// Wire trend codes.
pub const TREND_UP: u8 = 0;
pub const TREND_DOWN: u8 = 1;
pub const TREND_UNKNOWN: u8 = 2;
