//! Per-connection protocol sessions.
//!
//! - [`expert_advisor`] : candle-driven trading turns with nested order requests
//! - [`indicator`]      : candle in, trend out
//! - [`dispatcher`]     : inbound routing inside an expert advisor turn
//! - [`gateway`]        : the terminal-backed [`Broker`](crate::api::Broker)
//! - [`correlation`]    : order id → listener table

pub mod correlation;
pub mod dispatcher;
pub mod expert_advisor;
pub mod gateway;
pub mod indicator;

pub use correlation::CorrelationTable;
pub use expert_advisor::ExpertAdvisorSession;
pub use gateway::RemoteBroker;
pub use indicator::run_indicator;
