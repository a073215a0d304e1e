//! bridge-server
//!
//! Strategy host for remote trading terminals: terminals connect over
//! TCP, select an expert advisor or an indicator by number and are then
//! served by a blocking, turn-based protocol session.

pub mod advisors;
pub mod api;
pub mod capacity;
pub mod client;
pub mod communicator;
pub mod config;
pub mod error;
pub mod indicators;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

pub use api::{
    BalanceManager, Broker, CapacityLease, CapacityPool, ExpertAdvisor, ExpertAdvisorFactory,
    Indicator, IndicatorFactory, OrderEventListener, OrderHandle, Placement,
};
pub use capacity::{LentCapacity, VolumePool};
pub use communicator::serve_connection;
pub use error::{InvariantViolation, SessionError};
pub use registry::AlgorithmRegistry;
pub use types::{ClientId, HostServices};
