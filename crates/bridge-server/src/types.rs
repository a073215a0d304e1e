//! Shared types for the strategy host server.
//!
//! This module defines:
//! - `ClientId`: a lightweight handle for connected terminals
//! - `HostServices`: what every session borrows from the process

use std::sync::Arc;

use crate::api::{CapacityPool, ExpertAdvisorFactory, IndicatorFactory};
use crate::registry::AlgorithmRegistry;

/// Identifier for a connected terminal.
///
/// Unique over the lifetime of the process; used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Algorithm factories and the shared capacity pool.
#[derive(Clone)]
pub struct HostServices {
    pub advisors: Arc<dyn ExpertAdvisorFactory>,
    pub indicators: Arc<dyn IndicatorFactory>,
    pub capacity: Arc<dyn CapacityPool>,
}

impl HostServices {
    pub fn new<P>(registry: AlgorithmRegistry, capacity: P) -> Self
    where
        P: CapacityPool + 'static,
    {
        let registry = Arc::new(registry);
        HostServices {
            advisors: registry.clone(),
            indicators: registry,
            capacity: Arc::new(capacity),
        }
    }
}
