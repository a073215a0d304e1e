//! bridge-core
//!
//! Values shared by the strategy host and the terminal protocol:
//! - fixed-point prices, volumes and money
//! - candles and trend directions
//! - pending orders and their close conditions
//! - the trading environment reported at connection start
//! - terminal failure codes
//! - the logical message set exchanged with the terminal

pub mod candle;
pub mod environment;
pub mod failure;
pub mod messages;
pub mod order;
pub mod price;
pub mod volume;

pub use candle::{Candle, FullCandle, MarketDirection};
pub use environment::{TradingEnvironment, VolumeConstraints};
pub use failure::Failure;

pub use messages::{
    AlgorithmKind,
    ChangeCloseConditions,
    ChangeConditionsResponse,
    Message,
    OrderEvent,
    PlaceOrderResponse,
    SelectAlgorithm,
};

pub use order::{CloseConditions, ExecutionCondition, OrderId, OrderType, PendingOrder};
pub use price::Price;
pub use volume::{Money, Volume};
