//! The broker an expert advisor talks to during its turn.
//!
//! Each call is a nested round trip on the connection the current turn is
//! using: the request goes out and, where the protocol defines a reply,
//! exactly one reply of the matching type is read before control returns
//! to the strategy. Nothing else may arrive in between.
//!
//! The first error a call raises is latched. From then on the connection
//! is out of step with the terminal, so every later call fails with the
//! same error without touching the wire, and the dispatcher ends the turn
//! with it whatever the strategy returned.

use bridge_core::{
    ChangeCloseConditions, ChangeConditionsResponse, CloseConditions, Failure, Message,
    PendingOrder, PlaceOrderResponse,
};
use bridge_protocol::{read_expected, write_message, Transport};
use tracing::{debug, info, warn};

use crate::api::{Broker, OrderEventListener, OrderHandle, Placement};
use crate::error::{InvariantViolation, SessionError};
use crate::session::correlation::CorrelationTable;

/// [`Broker`] backed by the terminal on the other end of `transport`.
pub struct RemoteBroker<'a, T: ?Sized> {
    transport: &'a mut T,
    orders: &'a mut CorrelationTable,
    failure: Option<SessionError>,
}

impl<'a, T: Transport + ?Sized> RemoteBroker<'a, T> {
    pub fn new(transport: &'a mut T, orders: &'a mut CorrelationTable) -> Self {
        RemoteBroker {
            transport,
            orders,
            failure: None,
        }
    }

    /// First error raised by any call, whether or not the caller passed it on.
    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }

    pub fn into_failure(self) -> Option<SessionError> {
        self.failure
    }

    fn latched<R>(
        &mut self,
        call: impl FnOnce(&mut Self) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        if let Some(failure) = &self.failure {
            debug!("refusing broker call after an earlier failure: {}", failure);
            return Err(failure.clone());
        }

        let result = call(self);
        if let Err(err) = &result {
            self.failure = Some(err.clone());
        }
        result
    }

    fn ensure_open(&self, handle: &OrderHandle, action: &'static str) -> Result<(), SessionError> {
        if self.orders.has(handle.id()) {
            Ok(())
        } else {
            Err(InvariantViolation::OrderAlreadyClosed {
                id: handle.id(),
                action,
            }
            .into())
        }
    }

    fn send_order(
        &mut self,
        order: PendingOrder,
        listener: Box<dyn OrderEventListener>,
    ) -> Result<Placement, SessionError> {
        debug!(?order, "placing pending order");
        write_message(&mut *self.transport, &Message::PlaceOrder(order))?;

        let response: PlaceOrderResponse = read_expected(&mut *self.transport)?;
        match response.outcome {
            Ok(id) => {
                self.orders.put(id, listener);
                info!("terminal accepted order {}", id);
                Ok(Ok(OrderHandle::new(id)))
            }
            Err(failure) => {
                warn!("terminal rejected order placement: {}", failure);
                Ok(Err(failure))
            }
        }
    }

    fn send_close_or_cancel(&mut self, handle: &OrderHandle) -> Result<(), SessionError> {
        self.ensure_open(handle, "close or cancel")?;

        write_message(&mut *self.transport, &Message::CloseOrCancel(handle.id()))?;
        self.orders.remove(handle.id())?;
        info!("requested close or cancel of order {}", handle.id());
        Ok(())
    }

    fn send_close_conditions(
        &mut self,
        handle: &OrderHandle,
        conditions: CloseConditions,
    ) -> Result<Option<Failure>, SessionError> {
        self.ensure_open(handle, "change the close conditions of")?;

        let request = ChangeCloseConditions {
            id: handle.id(),
            conditions,
        };
        write_message(&mut *self.transport, &Message::ChangeCloseConditions(request))?;

        let response: ChangeConditionsResponse = read_expected(&mut *self.transport)?;
        if let Some(failure) = &response.failure {
            warn!(
                "terminal rejected new close conditions for order {}: {}",
                handle.id(),
                failure
            );
        }
        Ok(response.failure)
    }
}

impl<'a, T: Transport + ?Sized> Broker for RemoteBroker<'a, T> {
    fn place(
        &mut self,
        order: PendingOrder,
        listener: Box<dyn OrderEventListener>,
    ) -> Result<Placement, SessionError> {
        self.latched(|broker| broker.send_order(order, listener))
    }

    fn close_or_cancel(&mut self, handle: &OrderHandle) -> Result<(), SessionError> {
        self.latched(|broker| broker.send_close_or_cancel(handle))
    }

    fn change_close_conditions(
        &mut self,
        handle: &OrderHandle,
        conditions: CloseConditions,
    ) -> Result<Option<Failure>, SessionError> {
        self.latched(|broker| broker.send_close_conditions(handle, conditions))
    }
}
