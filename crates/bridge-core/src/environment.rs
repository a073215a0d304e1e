//! Account and instrument information sent once per connection.

use chrono::{DateTime, Utc};

use crate::price::Price;
use crate::volume::Volume;

/// Volume limits the broker enforces for the traded symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConstraints {
    pub min: Volume,
    pub step: Volume,
    pub max: Volume,
}

/// Everything the terminal tells the host about the account it trades on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingEnvironment {
    pub broker_name: String,
    pub account_number: i64,
    /// ISO code of the account currency, e.g. `"EUR"`.
    pub account_currency: String,

    /// Symbol traded by the connected chart, e.g. `"EURUSD"`.
    pub trade_symbol: String,

    /// Symbol converting the quote currency into the account currency.
    pub account_symbol: String,

    /// Broker markup on the spread, in pipettes.
    pub markup: Price,

    /// Commission per trade, in pipettes.
    pub commission: Price,

    /// Candles before this instant are historic replay data.
    pub first_live_time: DateTime<Utc>,

    pub volume_constraints: VolumeConstraints,
}
