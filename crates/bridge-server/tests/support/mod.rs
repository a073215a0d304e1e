//! In-memory terminal and recording collaborators shared by the session tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bridge_core::{
    Candle, CloseConditions, ExecutionCondition, FullCandle, Message, Money, OrderType,
    PendingOrder, Price, TradingEnvironment, Volume, VolumeConstraints,
};
use bridge_protocol::{read_message, write_message, Transport, TransportError};
use bridge_server::{
    AlgorithmRegistry, BalanceManager, Broker, CapacityLease, CapacityPool, ExpertAdvisor,
    HostServices, OrderEventListener, OrderHandle, SessionError,
};
use bridge_server::indicators::CandleBodyTrend;
use chrono::{DateTime, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Scripted terminal
// ---------------------------------------------------------------------------

/// Plays back a fixed inbound byte script and records every byte the host
/// writes together with how much of the script had been consumed by then.
pub struct ScriptedTerminal {
    inbound: Vec<u8>,
    cursor: usize,
    /// Offset in `inbound` just past each scripted message.
    boundaries: Vec<usize>,
    fail_at: Option<usize>,
    written: Vec<u8>,
    written_at: Vec<usize>,
}

/// One host → terminal message and the inbound offset at which it was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub message: Message,
    pub after_inbound: usize,
}

impl ScriptedTerminal {
    pub fn new(script: &[Message]) -> Self {
        let mut encoder = Self::from_bytes(Vec::new());
        let mut boundaries = Vec::with_capacity(script.len());
        for message in script {
            write_message(&mut encoder, message).expect("in-memory encode");
            boundaries.push(encoder.written.len());
        }

        let mut terminal = Self::from_bytes(encoder.written);
        terminal.boundaries = boundaries;
        terminal
    }

    pub fn from_bytes(inbound: Vec<u8>) -> Self {
        ScriptedTerminal {
            inbound,
            cursor: 0,
            boundaries: Vec::new(),
            fail_at: None,
            written: Vec::new(),
            written_at: Vec::new(),
        }
    }

    pub fn into_inbound_bytes(self) -> Vec<u8> {
        self.inbound
    }

    /// Reads at or beyond the end of the script fail with an I/O error
    /// instead of a clean close.
    pub fn failing_after_script(mut self) -> Self {
        self.fail_at = Some(self.inbound.len());
        self
    }

    /// Offset just past the `index`-th scripted message.
    pub fn end_of(&self, index: usize) -> usize {
        self.boundaries[index]
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn fully_consumed(&self) -> bool {
        self.cursor == self.inbound.len()
    }

    /// Decode everything the host wrote.
    pub fn sent(&self) -> Vec<Sent> {
        let mut replay = Self::from_bytes(self.written.clone());
        let mut sent = Vec::new();
        loop {
            let start = replay.cursor;
            match read_message(&mut replay) {
                Ok(message) => sent.push(Sent {
                    message,
                    after_inbound: self.written_at[start],
                }),
                Err(err) if err.is_closed() => return sent,
                Err(err) => panic!("host wrote an undecodable message: {err}"),
            }
        }
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent().into_iter().map(|s| s.message).collect()
    }

    fn take(&mut self, n: usize) -> Result<&[u8], TransportError> {
        if let Some(limit) = self.fail_at {
            if self.cursor + n > limit {
                return Err(TransportError::io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "scripted connection reset",
                )));
            }
        }
        if self.cursor + n > self.inbound.len() {
            self.cursor = self.inbound.len();
            return Err(TransportError::Closed);
        }
        let bytes = &self.inbound[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(bytes)
    }

    fn put(&mut self, bytes: &[u8]) {
        self.written.extend_from_slice(bytes);
        self.written_at
            .extend(std::iter::repeat(self.cursor).take(bytes.len()));
    }
}

impl Transport for ScriptedTerminal {
    fn read_u8(&mut self) -> Result<u8, TransportError> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, TransportError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64, TransportError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(i64::from_be_bytes(buf))
    }

    fn read_f64(&mut self) -> Result<f64, TransportError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String, TransportError> {
        let mut len = [0u8; 2];
        len.copy_from_slice(self.take(2)?);
        let bytes = self.take(u16::from_be_bytes(len) as usize)?.to_vec();
        String::from_utf8(bytes).map_err(|_| TransportError::InvalidUtf8)
    }

    fn write_u8(&mut self, v: u8) -> Result<(), TransportError> {
        self.put(&[v]);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), TransportError> {
        self.put(&v.to_be_bytes());
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<(), TransportError> {
        self.put(&v.to_be_bytes());
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), TransportError> {
        self.put(&v.to_be_bytes());
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<(), TransportError> {
        let len = u16::try_from(v.len()).map_err(|_| TransportError::StringTooLong(v.len()))?;
        self.put(&len.to_be_bytes());
        self.put(v.as_bytes());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_650_000_000 + secs, 0).unwrap()
}

pub fn environment() -> TradingEnvironment {
    TradingEnvironment {
        broker_name: "Test Broker".to_string(),
        account_number: 4_711,
        account_currency: "EUR".to_string(),
        trade_symbol: "EURUSD".to_string(),
        account_symbol: "EURUSD".to_string(),
        markup: Price::from_pipettes(3),
        commission: Price::from_pipettes(5),
        first_live_time: at(0),
        volume_constraints: VolumeConstraints {
            min: Volume::from_base(1_000),
            step: Volume::from_base(1_000),
            max: Volume::from_base(5_000_000),
        },
    }
}

pub fn candle(minute: i64, open: i64, close: i64) -> Candle {
    Candle {
        time: at(minute * 60),
        open: Price::from_pipettes(open),
        high: Price::from_pipettes(open.max(close) + 20),
        low: Price::from_pipettes(open.min(close) - 20),
        close: Price::from_pipettes(close),
    }
}

pub fn full_candle(minute: i64) -> Message {
    Message::MarketDataExtended(FullCandle {
        candle: candle(minute, 110_000, 110_050),
        spread: Price::from_pipettes(12),
        volume: Volume::from_base(250),
        tick_count: 87,
    })
}

pub fn buy_limit() -> PendingOrder {
    PendingOrder {
        order_type: OrderType::Buy,
        condition: ExecutionCondition::Limit,
        volume: Volume::from_base(10_000),
        entry_price: Price::from_pipettes(109_900),
        close_conditions: CloseConditions::new(
            Price::from_pipettes(110_400),
            Price::from_pipettes(109_600),
        ),
    }
}

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

/// Thread-safe event log shared between a test and the algorithms it built.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct JournalListener {
    journal: Journal,
}

impl JournalListener {
    pub fn boxed(journal: &Journal) -> Box<dyn OrderEventListener> {
        Box::new(JournalListener {
            journal: journal.clone(),
        })
    }
}

impl OrderEventListener for JournalListener {
    fn order_opened(&mut self, time: DateTime<Utc>, price: Price) {
        self.journal
            .push(format!("opened @ {} {}", price, time.timestamp()));
    }

    fn order_closed(&mut self, time: DateTime<Utc>, price: Price) {
        self.journal
            .push(format!("closed @ {} {}", price, time.timestamp()));
    }
}

/// What a scripted advisor sees on each candle.
pub struct AdvisorTurn<'a> {
    pub candle_index: usize,
    pub broker: &'a mut dyn Broker,
    pub handles: &'a mut Vec<OrderHandle>,
    pub journal: &'a Journal,
}

pub type CandleScript = dyn Fn(AdvisorTurn<'_>) -> Result<(), SessionError> + Send + Sync;

struct ScriptedAdvisor {
    script: Arc<CandleScript>,
    journal: Journal,
    candles: usize,
    handles: Vec<OrderHandle>,
}

impl ExpertAdvisor for ScriptedAdvisor {
    fn on_candle(
        &mut self,
        candle: &FullCandle,
        broker: &mut dyn Broker,
        _capacity: &mut dyn CapacityLease,
    ) -> Result<(), SessionError> {
        self.journal
            .push(format!("candle {}", candle.candle.time.timestamp()));
        let index = self.candles;
        self.candles += 1;
        (self.script)(AdvisorTurn {
            candle_index: index,
            broker,
            handles: &mut self.handles,
            journal: &self.journal,
        })
    }
}

/// Lease that records account updates and counts forced releases.
struct CountingLease {
    releases: Arc<AtomicUsize>,
    journal: Journal,
}

impl BalanceManager for CountingLease {
    fn balance_changed(&mut self, balance: Money) {
        self.journal.push(format!("balance {}", balance));
    }

    fn exchange_rate_changed(&mut self, rate: Price) {
        self.journal.push(format!("rate {}", rate));
    }
}

impl CapacityLease for CountingLease {
    fn request_volume(&mut self, wanted: Volume) -> Option<Volume> {
        Some(wanted)
    }

    fn return_volume(&mut self, _volume: Volume) {}

    fn release_all(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct CountingPool {
    pub leases: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub journal: Journal,
}

impl CountingPool {
    pub fn leases(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CapacityPool for CountingPool {
    fn lease(&self) -> Box<dyn CapacityLease> {
        self.leases.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingLease {
            releases: self.releases.clone(),
            journal: self.journal.clone(),
        })
    }
}

/// Host with expert advisor 7 running `script` and indicator 1 following
/// the candle body.
pub struct Harness {
    pub services: HostServices,
    pub pool: CountingPool,
    pub journal: Journal,
}

pub const ADVISOR: i32 = 7;
pub const INDICATOR: i32 = 1;

impl Harness {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(AdvisorTurn<'_>) -> Result<(), SessionError> + Send + Sync + 'static,
    {
        let journal = Journal::default();
        let pool = CountingPool {
            journal: journal.clone(),
            ..CountingPool::default()
        };

        let script: Arc<CandleScript> = Arc::new(script);
        let advisor_journal = journal.clone();
        let mut registry = AlgorithmRegistry::new();
        registry
            .register_expert_advisor(ADVISOR, move |env| {
                advisor_journal.push(format!("created for {}", env.trade_symbol));
                Box::new(ScriptedAdvisor {
                    script: Arc::clone(&script),
                    journal: advisor_journal.clone(),
                    candles: 0,
                    handles: Vec::new(),
                })
            })
            .register_indicator(INDICATOR, || Box::new(CandleBodyTrend));

        Harness {
            services: HostServices::new(registry, pool.clone()),
            pool,
            journal,
        }
    }

    /// Advisor that never touches the broker.
    pub fn passive() -> Self {
        Self::new(|_| Ok(()))
    }
}
