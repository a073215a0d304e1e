//! Minimal terminal simulator.
//!
//! Connects to a running bridge-server and feeds a short synthetic price
//! walk to either an indicator (the default) or an expert advisor. In
//! advisor mode it accepts every order, fills it on the next candle and
//! reports it closed on the one after.
//!
//! ```text
//! cargo run -p bridge-server --example terminal_sim
//! BRIDGE_SIM_MODE=advisor BRIDGE_SIM_NUMBER=1 cargo run ...
//! ```

use std::env;
use std::error::Error;
use std::net::TcpStream;

use bridge_core::{
    AlgorithmKind, Candle, FullCandle, Message, OrderEvent, OrderId, PlaceOrderResponse, Price,
    SelectAlgorithm, TradingEnvironment, Volume, VolumeConstraints,
};
use bridge_protocol::{read_message, write_message, StreamTransport};
use chrono::{DateTime, Duration, TimeZone, Utc};

type SimResult<T> = Result<T, Box<dyn Error>>;

const CLOSES: [i64; 7] = [
    110_000, 110_040, 110_025, 110_025, 110_090, 109_980, 110_010,
];

fn main() -> SimResult<()> {
    let addr = env::var("BRIDGE_SIM_ADDR").unwrap_or_else(|_| "127.0.0.1:6474".to_string());
    let advisor_mode = env::var("BRIDGE_SIM_MODE").map_or(false, |m| m == "advisor");
    let number: i32 = env::var("BRIDGE_SIM_NUMBER")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or(1);

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr)?;
    let mut terminal = StreamTransport::from_tcp(stream)?;

    let start = Utc
        .timestamp_opt(1_700_000_000, 0)
        .single()
        .ok_or("start time out of range")?;
    let candles = price_walk(start);

    if advisor_mode {
        println!("Connected, selecting expert advisor {}.", number);
        run_advisor(&mut terminal, number, start, &candles)?;
    } else {
        println!("Connected, selecting indicator {}.", number);
        run_indicator(&mut terminal, number, &candles)?;
    }

    println!("Done.");
    Ok(())
}

fn price_walk(start: DateTime<Utc>) -> Vec<Candle> {
    let mut open = 109_990;
    let mut candles = Vec::with_capacity(CLOSES.len());
    for (i, close) in CLOSES.iter().copied().enumerate() {
        candles.push(Candle {
            time: start + Duration::minutes(i as i64),
            open: Price::from_pipettes(open),
            high: Price::from_pipettes(open.max(close) + 15),
            low: Price::from_pipettes(open.min(close) - 15),
            close: Price::from_pipettes(close),
        });
        open = close;
    }
    candles
}

fn run_indicator(terminal: &mut StreamTransport<TcpStream, TcpStream>, number: i32, candles: &[Candle]) -> SimResult<()> {
    write_message(
        terminal,
        &Message::SelectAlgorithm(SelectAlgorithm {
            kind: AlgorithmKind::Indicator,
            number,
        }),
    )?;

    for candle in candles {
        write_message(terminal, &Message::MarketData(candle.clone()))?;

        match read_message(terminal)? {
            Message::TrendResult(trend) => println!(
                "{}  open {}  close {}  ->  {}",
                candle.time,
                candle.open,
                candle.close,
                trend.map_or("unknown".to_string(), |t| format!("{:?}", t))
            ),
            other => return Err(format!("unexpected reply: {:?}", other).into()),
        }
    }
    Ok(())
}

fn run_advisor(
    terminal: &mut StreamTransport<TcpStream, TcpStream>,
    number: i32,
    start: DateTime<Utc>,
    candles: &[Candle],
) -> SimResult<()> {
    write_message(
        terminal,
        &Message::SelectAlgorithm(SelectAlgorithm {
            kind: AlgorithmKind::ExpertAdvisor,
            number,
        }),
    )?;
    write_message(terminal, &Message::EnvironmentInfo(environment(start)))?;

    let mut next_id = 1;
    let mut pending: Vec<OrderId> = Vec::new();
    let mut open: Vec<OrderId> = Vec::new();

    for candle in candles {
        for id in open.drain(..) {
            let event = OrderEvent {
                id,
                time: candle.time,
                price: candle.open,
            };
            println!("{}  closing {}", candle.time, id);
            run_turn(terminal, Message::OrderClosed(event), &mut next_id)?;
        }
        for id in pending.drain(..) {
            let event = OrderEvent {
                id,
                time: candle.time,
                price: candle.open,
            };
            println!("{}  filling {}", candle.time, id);
            run_turn(terminal, Message::OrderFilled(event), &mut next_id)?;
            open.push(id);
        }

        let full = FullCandle {
            candle: candle.clone(),
            spread: Price::from_pipettes(12),
            volume: Volume::from_base(250),
            tick_count: 60,
        };
        println!("{}  open {}  close {}", candle.time, candle.open, candle.close);
        let turn = run_turn(terminal, Message::MarketDataExtended(full), &mut next_id)?;
        pending.extend(turn.placed);
        pending.retain(|id| !turn.cancelled.contains(id));
        open.retain(|id| !turn.cancelled.contains(id));
    }
    Ok(())
}

#[derive(Default)]
struct Turn {
    placed: Vec<OrderId>,
    cancelled: Vec<OrderId>,
}

/// Sends one message and answers the host until it completes its turn.
fn run_turn(terminal: &mut StreamTransport<TcpStream, TcpStream>, message: Message, next_id: &mut i32) -> SimResult<Turn> {
    write_message(terminal, &message)?;

    let mut turn = Turn::default();
    loop {
        match read_message(terminal)? {
            Message::TurnComplete => return Ok(turn),
            Message::PlaceOrder(order) => {
                let id = OrderId(*next_id);
                *next_id += 1;
                println!(
                    "    place {:?} {:?} {} @ {}  tp {}  sl {}  ->  {}",
                    order.order_type,
                    order.condition,
                    order.volume.base_units(),
                    order.entry_price,
                    order.close_conditions.take_profit,
                    order.close_conditions.stop_loss,
                    id
                );
                write_message(
                    terminal,
                    &Message::PlaceOrderResponse(PlaceOrderResponse { outcome: Ok(id) }),
                )?;
                turn.placed.push(id);
            }
            Message::CloseOrCancel(id) => {
                println!("    close or cancel {}", id);
                turn.cancelled.push(id);
            }
            other => return Err(format!("unexpected request: {:?}", other).into()),
        }
    }
}

fn environment(start: DateTime<Utc>) -> TradingEnvironment {
    TradingEnvironment {
        broker_name: "Simulated Broker".to_string(),
        account_number: 1,
        account_currency: "EUR".to_string(),
        trade_symbol: "EURUSD".to_string(),
        account_symbol: "EURUSD".to_string(),
        markup: Price::ZERO,
        commission: Price::ZERO,
        first_live_time: start,
        volume_constraints: VolumeConstraints {
            min: Volume::from_base(1_000),
            step: Volume::from_base(1_000),
            max: Volume::from_base(1_000_000),
        },
    }
}
