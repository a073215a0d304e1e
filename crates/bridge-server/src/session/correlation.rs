//! Order id → listener bookkeeping for one expert advisor session.

use std::collections::HashMap;

use bridge_core::OrderId;

use crate::api::OrderEventListener;
use crate::error::InvariantViolation;

/// Listeners of the orders that are open or pending on this connection.
///
/// An id enters when the terminal accepts a placement and leaves when the
/// order is closed or canceled. Ids the terminal mentions that are not in
/// here are the terminal's fault; callers check [`has`](Self::has) first
/// so that `get`/`remove` failing means the host lost track of its own
/// state.
#[derive(Default)]
pub struct CorrelationTable {
    listeners: HashMap<OrderId, Box<dyn OrderEventListener>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `id`, replacing any stale entry.
    pub fn put(&mut self, id: OrderId, listener: Box<dyn OrderEventListener>) {
        self.listeners.insert(id, listener);
    }

    pub fn has(&self, id: OrderId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn get(
        &mut self,
        id: OrderId,
    ) -> Result<&mut (dyn OrderEventListener + 'static), InvariantViolation> {
        self.listeners
            .get_mut(&id)
            .map(|listener| listener.as_mut())
            .ok_or(InvariantViolation::MissingListener {
                id,
                operation: "lookup",
            })
    }

    pub fn remove(
        &mut self,
        id: OrderId,
    ) -> Result<Box<dyn OrderEventListener>, InvariantViolation> {
        self.listeners
            .remove(&id)
            .ok_or(InvariantViolation::MissingListener {
                id,
                operation: "removal",
            })
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::Price;
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<&'static str>>>);

    impl OrderEventListener for Recorder {
        fn order_opened(&mut self, _time: DateTime<Utc>, _price: Price) {
            self.0.borrow_mut().push("opened");
        }

        fn order_closed(&mut self, _time: DateTime<Utc>, _price: Price) {
            self.0.borrow_mut().push("closed");
        }
    }

    #[test]
    fn registered_listener_is_reachable_until_removed() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut table = CorrelationTable::new();
        table.put(OrderId(7), Box::new(Recorder(events.clone())));

        assert!(table.has(OrderId(7)));
        assert!(!table.has(OrderId(8)));

        table
            .get(OrderId(7))
            .expect("listener registered")
            .order_opened(DateTime::<Utc>::UNIX_EPOCH, Price::ZERO);
        let mut listener = table.remove(OrderId(7)).expect("listener registered");
        listener.order_closed(DateTime::<Utc>::UNIX_EPOCH, Price::ZERO);

        assert!(table.is_empty());
        assert_eq!(*events.borrow(), vec!["opened", "closed"]);
    }

    #[test]
    fn missing_ids_are_invariant_violations() {
        let mut table = CorrelationTable::new();

        match table.get(OrderId(3)) {
            Err(InvariantViolation::MissingListener { id, operation }) => {
                assert_eq!(id, OrderId(3));
                assert_eq!(operation, "lookup");
            }
            Ok(_) => panic!("lookup of an unknown id must fail"),
            Err(other) => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            table.remove(OrderId(3)),
            Err(InvariantViolation::MissingListener { operation: "removal", .. })
        ));
    }
}
