//! Shared trading capacity and the per-session guard around it.
//!
//! [`VolumePool`] caps the total volume all connected expert advisors may
//! hold at once. Each session leases from it; [`LentCapacity`] makes sure
//! the lease is handed back exactly once however the session ends.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bridge_core::{Money, Price, Volume};
use tracing::{debug, info, warn};

use crate::api::{BalanceManager, CapacityLease, CapacityPool};

#[derive(Debug)]
struct PoolState {
    limit: Volume,
    lent: Volume,
    balance: Option<Money>,
    exchange_rate: Option<Price>,
}

/// Process-wide volume budget shared by every session.
#[derive(Debug, Clone)]
pub struct VolumePool {
    state: Arc<Mutex<PoolState>>,
}

impl VolumePool {
    pub fn new(limit: Volume) -> Self {
        VolumePool {
            state: Arc::new(Mutex::new(PoolState {
                limit,
                lent: Volume::ZERO,
                balance: None,
                exchange_rate: None,
            })),
        }
    }

    /// Volume not currently lent to any session.
    pub fn available(&self) -> Volume {
        let state = lock(&self.state);
        state.limit.saturating_sub(state.lent)
    }

    /// Most recent balance any terminal reported.
    pub fn last_balance(&self) -> Option<Money> {
        lock(&self.state).balance.clone()
    }

    pub fn last_exchange_rate(&self) -> Option<Price> {
        lock(&self.state).exchange_rate
    }
}

impl CapacityPool for VolumePool {
    fn lease(&self) -> Box<dyn CapacityLease> {
        Box::new(PoolLease {
            state: Arc::clone(&self.state),
            lots: Vec::new(),
        })
    }
}

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    // A session thread that panicked mid-update leaves plain numbers behind.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One session's share of a [`VolumePool`].
struct PoolLease {
    state: Arc<Mutex<PoolState>>,
    lots: Vec<Volume>,
}

impl BalanceManager for PoolLease {
    fn balance_changed(&mut self, balance: Money) {
        lock(&self.state).balance = Some(balance);
    }

    fn exchange_rate_changed(&mut self, rate: Price) {
        lock(&self.state).exchange_rate = Some(rate);
    }
}

impl CapacityLease for PoolLease {
    fn request_volume(&mut self, wanted: Volume) -> Option<Volume> {
        if wanted <= Volume::ZERO {
            return None;
        }

        let mut state = lock(&self.state);
        let available = state.limit.saturating_sub(state.lent);
        let granted = wanted.min(available);
        if granted <= Volume::ZERO {
            debug!("no volume left to lend ({} wanted)", wanted);
            return None;
        }

        state.lent = state.lent.saturating_add(granted);
        self.lots.push(granted);
        Some(granted)
    }

    fn return_volume(&mut self, volume: Volume) {
        match self.lots.iter().position(|lot| *lot == volume) {
            Some(index) => {
                self.lots.swap_remove(index);
                let mut state = lock(&self.state);
                state.lent = state.lent.saturating_sub(volume);
            }
            None => warn!("ignoring return of {} which was never lent", volume),
        }
    }

    fn release_all(&mut self) {
        if self.lots.is_empty() {
            return;
        }

        let mut state = lock(&self.state);
        for lot in self.lots.drain(..) {
            warn!("forcefully returning {} still lent to a finished session", lot);
            state.lent = state.lent.saturating_sub(lot);
        }
    }
}

/// Drop guard releasing a session's lease exactly once.
///
/// Call [`release`](Self::release) on the ordinary exit paths; dropping
/// the guard covers the rest (early returns, panics).
pub struct LentCapacity {
    lease: Box<dyn CapacityLease>,
    released: bool,
}

impl LentCapacity {
    pub fn new(lease: Box<dyn CapacityLease>) -> Self {
        LentCapacity {
            lease,
            released: false,
        }
    }

    pub fn lease_mut(&mut self) -> &mut dyn CapacityLease {
        self.lease.as_mut()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.lease.release_all();
        info!("released the capacity lent to the session");
    }
}

impl Drop for LentCapacity {
    fn drop(&mut self) {
        self.release();
    }
}
