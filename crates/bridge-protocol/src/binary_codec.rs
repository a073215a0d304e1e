//! Binary encoding/decoding of terminal messages.
//!
//! This module converts between:
//! - a stream of primitives on a [`Transport`]
//! - high-level `bridge_core::Message` values
//!
//! Framing model (one message at a time, no length prefix):
//!
//! ```text
//! [tag u8][fields...]
//!
//! SelectAlgorithm (0):          u8 kind (0=expert advisor, 1=indicator), i32 number
//! MarketData (1):               i64 epoch-sec, f64 open, f64 high, f64 low, f64 close
//! TrendResult (2):              u8 trend (0=up, 1=down, 2=unknown)
//! PlaceOrder (3):               u8 flags, i32 volume, f64 entry, f64 take profit,
//!                               f64 stop loss, [i64 expiry if flags bit 3]
//! PlaceOrderResponse (4):       u8 success (0=ok), i32 id or error code
//! OrderFilled (5):              i32 id, i64 epoch-sec, f64 price
//! OrderClosed (6):              i32 id, i64 epoch-sec, f64 price
//! CloseOrCancel (7):            i32 id
//! TurnComplete (8):             -
//! MarketDataExtended (9):       i64 epoch-sec, f64 x4 OHLC, i32 spread (pipettes),
//!                               i32 base volume, i32 tick count
//! EnvironmentInfo (10):         str broker, i64 account, str currency, str trade symbol,
//!                               str account symbol, i32 markup, i32 commission,
//!                               i64 first live epoch-sec, i64 min, i64 step, i64 max volume
//! ChangeCloseConditions (11):   u8 has expiry, i32 id, f64 take profit, f64 stop loss,
//!                               [i64 expiry if has expiry]
//! ChangeConditionsResponse (12): u8 success (0=ok), [i32 error code if not ok]
//! BalanceChanged (13):          i64 balance in minor units
//! ExchangeRateChanged (14):     f64 rate
//! ```
//!
//! Prices travel as `f64` and are converted to fixed-point pipettes on
//! decode. Field values are not validated beyond what is needed to build
//! the typed message.

use bridge_core::{
    AlgorithmKind, Candle, ChangeCloseConditions, ChangeConditionsResponse, CloseConditions,
    ExecutionCondition, Failure, FullCandle, MarketDirection, Message, OrderEvent, OrderId,
    OrderType, PendingOrder, PlaceOrderResponse, Price, SelectAlgorithm, TradingEnvironment,
    Volume, VolumeConstraints,
};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{ProtocolViolation, TransportError, WireError};
use crate::transport::Transport;
use crate::wire_types::{
    MessageKind, FLAG_CONDITION_MASK, FLAG_CONDITION_SHIFT, FLAG_HAS_EXPIRY, FLAG_ORDER_TYPE,
    FLAG_RESERVED_MASK, TREND_DOWN, TREND_UNKNOWN, TREND_UP,
};

/// A message type that can be requested by [`read_expected`].
pub trait ExpectedMessage: Sized {
    const KIND: MessageKind;

    fn from_message(message: Message) -> Option<Self>;
}

macro_rules! expected_message {
    ($ty:ty => $variant:ident) => {
        impl ExpectedMessage for $ty {
            const KIND: MessageKind = MessageKind::$variant;

            fn from_message(message: Message) -> Option<Self> {
                match message {
                    Message::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

expected_message!(SelectAlgorithm => SelectAlgorithm);
expected_message!(Candle => MarketData);
expected_message!(FullCandle => MarketDataExtended);
expected_message!(TradingEnvironment => EnvironmentInfo);
expected_message!(PlaceOrderResponse => PlaceOrderResponse);
expected_message!(ChangeConditionsResponse => ChangeConditionsResponse);

// ============================================================================
// DECODE
// ============================================================================

/// Read the next message, whatever its type.
pub fn read_message<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let kind = read_kind(t)?;
    read_body(t, kind)
}

/// Read the next message and require it to be of type `M`.
///
/// A known tag of another type is [`ProtocolViolation::UnexpectedMessage`];
/// its body is left unread because the connection is unusable anyway.
pub fn read_expected<M, T>(t: &mut T) -> Result<M, WireError>
where
    M: ExpectedMessage,
    T: Transport + ?Sized,
{
    let actual = read_kind(t)?;
    if actual != M::KIND {
        return Err(ProtocolViolation::UnexpectedMessage {
            expected: M::KIND,
            actual,
        }
        .into());
    }

    let message = read_body(t, actual)?;
    M::from_message(message).ok_or_else(|| {
        ProtocolViolation::UnexpectedMessage {
            expected: M::KIND,
            actual,
        }
        .into()
    })
}

fn read_kind<T: Transport + ?Sized>(t: &mut T) -> Result<MessageKind, WireError> {
    let tag = t.read_u8()?;
    MessageKind::from_u8(tag).ok_or_else(|| ProtocolViolation::UnknownTag(tag).into())
}

fn read_body<T: Transport + ?Sized>(t: &mut T, kind: MessageKind) -> Result<Message, WireError> {
    // The tag was already consumed, so EOF from here on cuts a message in half.
    decode_body(t, kind).map_err(|err| match err {
        WireError::Transport(TransportError::Closed) => TransportError::Truncated(kind).into(),
        other => other,
    })
}

fn decode_body<T: Transport + ?Sized>(t: &mut T, kind: MessageKind) -> Result<Message, WireError> {
    match kind {
        MessageKind::SelectAlgorithm => decode_select_algorithm(t),
        MessageKind::MarketData => decode_candle(t, kind).map(Message::MarketData),
        MessageKind::TrendResult => decode_trend(t),
        MessageKind::PlaceOrder => decode_place_order(t),
        MessageKind::PlaceOrderResponse => decode_place_order_response(t),
        MessageKind::OrderFilled => decode_order_event(t, kind).map(Message::OrderFilled),
        MessageKind::OrderClosed => decode_order_event(t, kind).map(Message::OrderClosed),
        MessageKind::CloseOrCancel => Ok(Message::CloseOrCancel(OrderId(t.read_i32()?))),
        MessageKind::TurnComplete => Ok(Message::TurnComplete),
        MessageKind::MarketDataExtended => decode_full_candle(t),
        MessageKind::EnvironmentInfo => decode_environment(t),
        MessageKind::ChangeCloseConditions => decode_change_close_conditions(t),
        MessageKind::ChangeConditionsResponse => decode_change_conditions_response(t),
        MessageKind::BalanceChanged => Ok(Message::BalanceChanged(t.read_i64()?)),
        MessageKind::ExchangeRateChanged => Ok(Message::ExchangeRateChanged(read_price(t)?)),
    }
}

fn decode_select_algorithm<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let raw_kind = t.read_u8()?;
    let kind =
        AlgorithmKind::from_u8(raw_kind).ok_or(ProtocolViolation::UnknownAlgorithmKind(raw_kind))?;
    let number = t.read_i32()?;

    Ok(Message::SelectAlgorithm(SelectAlgorithm { kind, number }))
}

fn decode_candle<T: Transport + ?Sized>(t: &mut T, kind: MessageKind) -> Result<Candle, WireError> {
    let time = read_time(t, kind, "time")?;
    let open = read_price(t)?;
    let high = read_price(t)?;
    let low = read_price(t)?;
    let close = read_price(t)?;

    Ok(Candle {
        time,
        open,
        high,
        low,
        close,
    })
}

fn decode_trend<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let raw = t.read_u8()?;
    let trend = match raw {
        TREND_UP => Some(MarketDirection::Up),
        TREND_DOWN => Some(MarketDirection::Down),
        TREND_UNKNOWN => None,
        _ => return Err(invalid(MessageKind::TrendResult, "trend", raw as i64)),
    };

    Ok(Message::TrendResult(trend))
}

fn decode_place_order<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let kind = MessageKind::PlaceOrder;

    let flags = t.read_u8()?;
    if flags & FLAG_RESERVED_MASK != 0 {
        return Err(invalid(kind, "flags", flags as i64));
    }

    let order_type = if flags & FLAG_ORDER_TYPE == 0 {
        OrderType::Buy
    } else {
        OrderType::Sell
    };

    let raw_condition = (flags & FLAG_CONDITION_MASK) >> FLAG_CONDITION_SHIFT;
    let condition = ExecutionCondition::from_u8(raw_condition)
        .ok_or_else(|| invalid(kind, "execution condition", raw_condition as i64))?;

    let volume = Volume::from_base(t.read_i32()? as i64);
    let entry_price = read_price(t)?;
    let take_profit = read_price(t)?;
    let stop_loss = read_price(t)?;

    let expiry = if flags & FLAG_HAS_EXPIRY != 0 {
        Some(read_time(t, kind, "expiry")?)
    } else {
        None
    };

    Ok(Message::PlaceOrder(PendingOrder {
        order_type,
        condition,
        volume,
        entry_price,
        close_conditions: CloseConditions {
            take_profit,
            stop_loss,
            expiry,
        },
    }))
}

fn decode_place_order_response<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let success = t.read_u8()? == 0;
    let id_or_error = t.read_i32()?;

    let outcome = if success {
        Ok(OrderId(id_or_error))
    } else {
        Err(Failure::new(id_or_error))
    };

    Ok(Message::PlaceOrderResponse(PlaceOrderResponse { outcome }))
}

fn decode_order_event<T: Transport + ?Sized>(
    t: &mut T,
    kind: MessageKind,
) -> Result<OrderEvent, WireError> {
    let id = OrderId(t.read_i32()?);
    let time = read_time(t, kind, "time")?;
    let price = read_price(t)?;

    Ok(OrderEvent { id, time, price })
}

fn decode_full_candle<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let candle = decode_candle(t, MessageKind::MarketDataExtended)?;
    let spread = Price::from_pipettes(t.read_i32()? as i64);
    let volume = Volume::from_base(t.read_i32()? as i64);
    let tick_count = t.read_i32()?;

    Ok(Message::MarketDataExtended(FullCandle {
        candle,
        spread,
        volume,
        tick_count,
    }))
}

fn decode_environment<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let kind = MessageKind::EnvironmentInfo;

    let broker_name = t.read_string()?;
    let account_number = t.read_i64()?;
    let account_currency = t.read_string()?;
    let trade_symbol = t.read_string()?;
    let account_symbol = t.read_string()?;
    let markup = Price::from_pipettes(t.read_i32()? as i64);
    let commission = Price::from_pipettes(t.read_i32()? as i64);
    let first_live_time = read_time(t, kind, "first live time")?;
    let min = Volume::from_base(t.read_i64()?);
    let step = Volume::from_base(t.read_i64()?);
    let max = Volume::from_base(t.read_i64()?);

    Ok(Message::EnvironmentInfo(TradingEnvironment {
        broker_name,
        account_number,
        account_currency,
        trade_symbol,
        account_symbol,
        markup,
        commission,
        first_live_time,
        volume_constraints: VolumeConstraints { min, step, max },
    }))
}

fn decode_change_close_conditions<T: Transport + ?Sized>(t: &mut T) -> Result<Message, WireError> {
    let kind = MessageKind::ChangeCloseConditions;

    let has_expiry = t.read_u8()? != 0;
    let id = OrderId(t.read_i32()?);
    let take_profit = read_price(t)?;
    let stop_loss = read_price(t)?;
    let expiry = if has_expiry {
        Some(read_time(t, kind, "expiry")?)
    } else {
        None
    };

    Ok(Message::ChangeCloseConditions(ChangeCloseConditions {
        id,
        conditions: CloseConditions {
            take_profit,
            stop_loss,
            expiry,
        },
    }))
}

fn decode_change_conditions_response<T: Transport + ?Sized>(
    t: &mut T,
) -> Result<Message, WireError> {
    let success = t.read_u8()? == 0;
    let failure = if success {
        None
    } else {
        Some(Failure::new(t.read_i32()?))
    };

    Ok(Message::ChangeConditionsResponse(ChangeConditionsResponse { failure }))
}

// ============================================================================
// ENCODE
// ============================================================================

/// Write one message. Nothing is pushed to the peer until the transport
/// flushes, which it does before the next blocking read.
pub fn write_message<T: Transport + ?Sized>(t: &mut T, msg: &Message) -> Result<(), TransportError> {
    t.write_u8(MessageKind::of(msg) as u8)?;

    match msg {
        Message::SelectAlgorithm(s) => {
            t.write_u8(s.kind as u8)?;
            t.write_i32(s.number)
        }
        Message::MarketData(c) => encode_candle(t, c),
        Message::TrendResult(trend) => {
            let raw = match trend {
                Some(MarketDirection::Up) => TREND_UP,
                Some(MarketDirection::Down) => TREND_DOWN,
                None => TREND_UNKNOWN,
            };
            t.write_u8(raw)
        }
        Message::PlaceOrder(order) => encode_place_order(t, order),
        Message::PlaceOrderResponse(r) => {
            let (success, id_or_error) = match r.outcome {
                Ok(id) => (0, id.0),
                Err(failure) => (1, failure.code),
            };
            t.write_u8(success)?;
            t.write_i32(id_or_error)
        }
        Message::OrderFilled(e) | Message::OrderClosed(e) => {
            t.write_i32(e.id.0)?;
            t.write_i64(e.time.timestamp())?;
            t.write_f64(e.price.as_f64())
        }
        Message::CloseOrCancel(id) => t.write_i32(id.0),
        Message::TurnComplete => Ok(()),
        Message::MarketDataExtended(full) => {
            encode_candle(t, &full.candle)?;
            t.write_i32(saturating_i32(full.spread.pipettes(), "spread"))?;
            t.write_i32(saturating_i32(full.volume.base_units(), "volume"))?;
            t.write_i32(full.tick_count)
        }
        Message::EnvironmentInfo(env) => encode_environment(t, env),
        Message::ChangeCloseConditions(change) => {
            let conditions = &change.conditions;
            t.write_u8(u8::from(conditions.expiry.is_some()))?;
            t.write_i32(change.id.0)?;
            t.write_f64(conditions.take_profit.as_f64())?;
            t.write_f64(conditions.stop_loss.as_f64())?;
            if let Some(expiry) = conditions.expiry {
                t.write_i64(expiry.timestamp())?;
            }
            Ok(())
        }
        Message::ChangeConditionsResponse(r) => match r.failure {
            None => t.write_u8(0),
            Some(failure) => {
                t.write_u8(1)?;
                t.write_i32(failure.code)
            }
        },
        Message::BalanceChanged(balance) => t.write_i64(*balance),
        Message::ExchangeRateChanged(rate) => t.write_f64(rate.as_f64()),
    }
}

fn encode_candle<T: Transport + ?Sized>(t: &mut T, c: &Candle) -> Result<(), TransportError> {
    t.write_i64(c.time.timestamp())?;
    t.write_f64(c.open.as_f64())?;
    t.write_f64(c.high.as_f64())?;
    t.write_f64(c.low.as_f64())?;
    t.write_f64(c.close.as_f64())
}

fn encode_place_order<T: Transport + ?Sized>(
    t: &mut T,
    order: &PendingOrder,
) -> Result<(), TransportError> {
    let conditions = &order.close_conditions;

    let mut flags = order.order_type as u8;
    flags |= (order.condition as u8) << FLAG_CONDITION_SHIFT;
    if conditions.expiry.is_some() {
        flags |= FLAG_HAS_EXPIRY;
    }

    t.write_u8(flags)?;
    t.write_i32(saturating_i32(order.volume.base_units(), "order volume"))?;
    t.write_f64(order.entry_price.as_f64())?;
    t.write_f64(conditions.take_profit.as_f64())?;
    t.write_f64(conditions.stop_loss.as_f64())?;
    if let Some(expiry) = conditions.expiry {
        t.write_i64(expiry.timestamp())?;
    }
    Ok(())
}

fn encode_environment<T: Transport + ?Sized>(
    t: &mut T,
    env: &TradingEnvironment,
) -> Result<(), TransportError> {
    t.write_string(&env.broker_name)?;
    t.write_i64(env.account_number)?;
    t.write_string(&env.account_currency)?;
    t.write_string(&env.trade_symbol)?;
    t.write_string(&env.account_symbol)?;
    t.write_i32(saturating_i32(env.markup.pipettes(), "markup"))?;
    t.write_i32(saturating_i32(env.commission.pipettes(), "commission"))?;
    t.write_i64(env.first_live_time.timestamp())?;
    t.write_i64(env.volume_constraints.min.base_units())?;
    t.write_i64(env.volume_constraints.step.base_units())?;
    t.write_i64(env.volume_constraints.max.base_units())
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn read_price<T: Transport + ?Sized>(t: &mut T) -> Result<Price, TransportError> {
    Ok(Price::from_f64(t.read_f64()?))
}

fn read_time<T: Transport + ?Sized>(
    t: &mut T,
    kind: MessageKind,
    field: &'static str,
) -> Result<DateTime<Utc>, WireError> {
    let secs = t.read_i64()?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| invalid(kind, field, secs))
}

fn invalid(kind: MessageKind, field: &'static str, value: i64) -> WireError {
    ProtocolViolation::InvalidField { kind, field, value }.into()
}

// 32 bit wire fields; values outside the range are clamped.
fn saturating_i32(v: i64, field: &'static str) -> i32 {
    match i32::try_from(v) {
        Ok(v) => v,
        Err(_) => {
            let clamped = v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            warn!("{} {} does not fit the 32 bit wire field, sending {}", field, v, clamped);
            clamped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StreamTransport;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn encode(messages: &[Message]) -> Vec<u8> {
        let mut t = StreamTransport::new(&[0u8; 0][..], Vec::new());
        for m in messages {
            write_message(&mut t, m).unwrap();
        }
        t.into_writer().unwrap()
    }

    fn order(expiry: Option<DateTime<Utc>>) -> PendingOrder {
        PendingOrder {
            order_type: OrderType::Sell,
            condition: ExecutionCondition::Stop,
            volume: Volume::from_base(100_000),
            entry_price: Price::from_f64(1.12345),
            close_conditions: CloseConditions {
                take_profit: Price::from_f64(1.1),
                stop_loss: Price::from_f64(1.2),
                expiry,
            },
        }
    }

    fn all_variants() -> Vec<Message> {
        let candle = Candle {
            time: at(1_450_000_000),
            open: Price::from_f64(1.0911),
            high: Price::from_f64(1.0925),
            low: Price::from_f64(1.0902),
            close: Price::from_f64(1.0917),
        };
        vec![
            Message::SelectAlgorithm(SelectAlgorithm {
                kind: AlgorithmKind::Indicator,
                number: 3,
            }),
            Message::MarketData(candle.clone()),
            Message::TrendResult(Some(MarketDirection::Down)),
            Message::TrendResult(None),
            Message::PlaceOrder(order(None)),
            Message::PlaceOrder(order(Some(at(1_450_003_600)))),
            Message::PlaceOrderResponse(PlaceOrderResponse { outcome: Ok(OrderId(42)) }),
            Message::PlaceOrderResponse(PlaceOrderResponse {
                outcome: Err(Failure::new(134)),
            }),
            Message::OrderFilled(OrderEvent {
                id: OrderId(42),
                time: at(1_450_000_060),
                price: Price::from_f64(1.12345),
            }),
            Message::OrderClosed(OrderEvent {
                id: OrderId(42),
                time: at(1_450_000_120),
                price: Price::from_f64(1.1),
            }),
            Message::CloseOrCancel(OrderId(42)),
            Message::TurnComplete,
            Message::MarketDataExtended(FullCandle {
                candle,
                spread: Price::from_pipettes(12),
                volume: Volume::from_base(350),
                tick_count: 77,
            }),
            Message::EnvironmentInfo(TradingEnvironment {
                broker_name: "Some Broker Ltd.".to_string(),
                account_number: 123_456_789,
                account_currency: "EUR".to_string(),
                trade_symbol: "EURUSD".to_string(),
                account_symbol: "EURUSD".to_string(),
                markup: Price::from_pipettes(3),
                commission: Price::from_pipettes(7),
                first_live_time: at(1_449_000_000),
                volume_constraints: VolumeConstraints {
                    min: Volume::from_base(1_000),
                    step: Volume::from_base(1_000),
                    max: Volume::from_base(50_000_000),
                },
            }),
            Message::ChangeCloseConditions(ChangeCloseConditions {
                id: OrderId(7),
                conditions: CloseConditions::new(Price::from_f64(1.3), Price::from_f64(1.0)),
            }),
            Message::ChangeCloseConditions(ChangeCloseConditions {
                id: OrderId(7),
                conditions: CloseConditions::new(Price::from_f64(1.3), Price::from_f64(1.0))
                    .expiring_at(at(1_450_086_400)),
            }),
            Message::ChangeConditionsResponse(ChangeConditionsResponse { failure: None }),
            Message::ChangeConditionsResponse(ChangeConditionsResponse {
                failure: Some(Failure::new(130)),
            }),
            Message::BalanceChanged(1_000_050),
            Message::ExchangeRateChanged(Price::from_f64(1.08765)),
        ]
    }

    #[test]
    fn every_variant_survives_encode_then_decode() {
        let messages = all_variants();
        let bytes = encode(&messages);

        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        for expected in &messages {
            assert_eq!(&read_message(&mut t).unwrap(), expected);
        }
        assert!(read_message(&mut t).unwrap_err().is_closed());
    }

    #[test]
    fn place_order_flags_pack_type_condition_and_expiry() {
        let bytes = encode(&[Message::PlaceOrder(order(Some(at(60))))]);
        assert_eq!(bytes[0], 3);
        // sell (1) | stop (2 << 1) | expiry (1 << 3)
        assert_eq!(bytes[1], 0b0000_1101);
        // tag, flags, volume, 3 prices, expiry
        assert_eq!(bytes.len(), 1 + 1 + 4 + 3 * 8 + 8);

        let without_expiry = encode(&[Message::PlaceOrder(order(None))]);
        assert_eq!(without_expiry[1], 0b0000_0101);
        assert_eq!(without_expiry.len(), 1 + 1 + 4 + 3 * 8);
    }

    #[test]
    fn unknown_tag_is_a_protocol_violation() {
        let mut t = StreamTransport::new(&[15u8][..], Vec::new());
        assert!(matches!(
            read_message(&mut t),
            Err(WireError::Protocol(ProtocolViolation::UnknownTag(15)))
        ));
    }

    #[test]
    fn truncated_body_names_the_message() {
        let mut bytes = encode(&[Message::BalanceChanged(5)]);
        bytes.truncate(4);

        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        assert!(matches!(
            read_message(&mut t),
            Err(WireError::Transport(TransportError::Truncated(MessageKind::BalanceChanged)))
        ));
    }

    #[test]
    fn reading_a_specific_type_rejects_other_types() {
        let bytes = encode(&[Message::BalanceChanged(5)]);
        let mut t = StreamTransport::new(&bytes[..], Vec::new());

        match read_expected::<PlaceOrderResponse, _>(&mut t) {
            Err(WireError::Protocol(ProtocolViolation::UnexpectedMessage { expected, actual })) => {
                assert_eq!(expected, MessageKind::PlaceOrderResponse);
                assert_eq!(actual, MessageKind::BalanceChanged);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reading_a_specific_type_still_rejects_unknown_tags() {
        let mut t = StreamTransport::new(&[200u8][..], Vec::new());
        assert!(matches!(
            read_expected::<TradingEnvironment, _>(&mut t),
            Err(WireError::Protocol(ProtocolViolation::UnknownTag(200)))
        ));
    }

    #[test]
    fn unknown_algorithm_kind_is_rejected() {
        let bytes = [0u8, 2, 0, 0, 0, 1];
        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        assert!(matches!(
            read_expected::<SelectAlgorithm, _>(&mut t),
            Err(WireError::Protocol(ProtocolViolation::UnknownAlgorithmKind(2)))
        ));
    }

    #[test]
    fn failed_change_response_carries_the_code() {
        let bytes = [12u8, 1, 0, 0, 0, 130];
        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        let response = read_expected::<ChangeConditionsResponse, _>(&mut t).unwrap();
        assert_eq!(response.failure, Some(Failure::new(130)));
    }

    fn boundary_values() -> Vec<Message> {
        let epoch = at(0);
        let below_zero = Price::from_pipettes(-123_456);
        let candle = Candle {
            time: epoch,
            open: below_zero,
            high: Price::ZERO,
            low: Price::from_pipettes(-999_999),
            close: Price::from_pipettes(-1),
        };
        vec![
            Message::SelectAlgorithm(SelectAlgorithm {
                kind: AlgorithmKind::ExpertAdvisor,
                number: i32::MIN,
            }),
            Message::SelectAlgorithm(SelectAlgorithm {
                kind: AlgorithmKind::Indicator,
                number: i32::MAX,
            }),
            Message::MarketData(candle.clone()),
            Message::PlaceOrder(PendingOrder {
                order_type: OrderType::Buy,
                condition: ExecutionCondition::Direct,
                volume: Volume::from_base(i32::MAX as i64),
                entry_price: below_zero,
                close_conditions: CloseConditions::new(Price::ZERO, Price::from_pipettes(-5))
                    .expiring_at(epoch),
            }),
            Message::PlaceOrderResponse(PlaceOrderResponse { outcome: Ok(OrderId(i32::MAX)) }),
            Message::PlaceOrderResponse(PlaceOrderResponse { outcome: Ok(OrderId(i32::MIN)) }),
            Message::PlaceOrderResponse(PlaceOrderResponse {
                outcome: Err(Failure::new(i32::MIN)),
            }),
            Message::PlaceOrderResponse(PlaceOrderResponse {
                outcome: Err(Failure::new(i32::MAX)),
            }),
            Message::OrderFilled(OrderEvent {
                id: OrderId(i32::MIN),
                time: epoch,
                price: below_zero,
            }),
            Message::OrderClosed(OrderEvent {
                id: OrderId(0),
                time: epoch,
                price: Price::ZERO,
            }),
            Message::CloseOrCancel(OrderId(i32::MAX)),
            Message::MarketDataExtended(FullCandle {
                candle,
                spread: Price::from_pipettes(i32::MIN as i64),
                volume: Volume::from_base(i32::MAX as i64),
                tick_count: i32::MIN,
            }),
            Message::EnvironmentInfo(TradingEnvironment {
                broker_name: String::new(),
                account_number: i64::MIN,
                account_currency: "€".to_string(),
                trade_symbol: "日本円".to_string(),
                account_symbol: String::new(),
                markup: Price::from_pipettes(i32::MAX as i64),
                commission: Price::from_pipettes(i32::MIN as i64),
                first_live_time: epoch,
                volume_constraints: VolumeConstraints {
                    min: Volume::ZERO,
                    step: Volume::from_base(1),
                    max: Volume::from_base(i64::MAX),
                },
            }),
            Message::ChangeCloseConditions(ChangeCloseConditions {
                id: OrderId(i32::MIN),
                conditions: CloseConditions::new(below_zero, Price::ZERO).expiring_at(epoch),
            }),
            Message::ChangeConditionsResponse(ChangeConditionsResponse {
                failure: Some(Failure::new(i32::MIN)),
            }),
            Message::BalanceChanged(i64::MIN),
            Message::BalanceChanged(i64::MAX),
            Message::ExchangeRateChanged(below_zero),
        ]
    }

    #[test]
    fn boundary_values_survive_encode_then_decode() {
        let messages = boundary_values();
        let bytes = encode(&messages);

        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        for expected in &messages {
            assert_eq!(&read_message(&mut t).unwrap(), expected);
        }
        assert!(read_message(&mut t).unwrap_err().is_closed());
    }

    #[test]
    fn multi_byte_strings_are_length_prefixed_in_bytes() {
        let messages = boundary_values();
        let env = messages
            .iter()
            .find(|m| matches!(m, Message::EnvironmentInfo(_)))
            .cloned()
            .unwrap();
        let bytes = encode(&[env]);

        // tag, empty broker name, account number, then "€" as 3 UTF-8 bytes
        assert_eq!(&bytes[1..3], &[0, 0]);
        assert_eq!(&bytes[11..13], &[0, 3]);
        assert_eq!(&bytes[13..16], "€".as_bytes());
    }

    #[test]
    fn oversized_order_volume_is_clamped_to_the_wire_range() {
        let mut oversized = order(None);
        oversized.volume = Volume::from_base(i32::MAX as i64 + 1);
        let bytes = encode(&[Message::PlaceOrder(oversized)]);

        // tag, flags, then the volume
        assert_eq!(&bytes[2..6], &i32::MAX.to_be_bytes());

        let mut t = StreamTransport::new(&bytes[..], Vec::new());
        match read_message(&mut t).unwrap() {
            Message::PlaceOrder(sent) => {
                assert_eq!(sent.volume, Volume::from_base(i32::MAX as i64))
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_fields_clamp_towards_the_nearest_bound() {
        assert_eq!(saturating_i32(i64::MIN, "spread"), i32::MIN);
        assert_eq!(saturating_i32(i64::MAX, "markup"), i32::MAX);
        assert_eq!(saturating_i32(-42, "commission"), -42);
    }
}
