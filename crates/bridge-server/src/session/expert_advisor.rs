//! Expert advisor sessions.
//!
//! After the handshake the terminal drives the conversation: it sends one
//! message, the host handles it (possibly performing nested order round
//! trips on the same connection) and answers with a turn-complete marker.
//! The terminal never sends its next message before that marker.

use std::convert::Infallible;

use bridge_core::{Message, TradingEnvironment};
use bridge_protocol::{read_expected, read_message, write_message, ProtocolViolation, Transport};
use tracing::{debug, info};

use crate::api::{CapacityPool, ExpertAdvisor, ExpertAdvisorFactory};
use crate::capacity::LentCapacity;
use crate::error::SessionError;
use crate::session::correlation::CorrelationTable;
use crate::session::dispatcher::{dispatch, TurnContext};

pub struct ExpertAdvisorSession<'t, T: ?Sized> {
    transport: &'t mut T,
    environment: TradingEnvironment,
    advisor: Box<dyn ExpertAdvisor>,
    orders: CorrelationTable,
    capacity: LentCapacity,
}

impl<'t, T: Transport + ?Sized> ExpertAdvisorSession<'t, T> {
    /// Read the trading environment, lease capacity and build the advisor
    /// registered under `number`.
    ///
    /// If the number is unknown the freshly acquired lease is released
    /// before the error is returned.
    pub fn handshake(
        transport: &'t mut T,
        number: i32,
        advisors: &dyn ExpertAdvisorFactory,
        pool: &dyn CapacityPool,
    ) -> Result<Self, SessionError> {
        let environment: TradingEnvironment = read_expected(&mut *transport)?;
        info!(
            "trading {} on account {} ({}) at {}",
            environment.trade_symbol,
            environment.account_number,
            environment.account_currency,
            environment.broker_name
        );
        debug!(?environment, "terminal environment");

        let mut capacity = LentCapacity::new(pool.lease());

        let Some(advisor) = advisors.expert_advisor(number, &environment) else {
            capacity.release();
            return Err(ProtocolViolation::UnknownAlgorithm {
                algorithm: "expert advisor",
                number,
            }
            .into());
        };

        Ok(ExpertAdvisorSession {
            transport,
            environment,
            advisor,
            orders: CorrelationTable::new(),
            capacity,
        })
    }

    pub fn environment(&self) -> &TradingEnvironment {
        &self.environment
    }

    /// Serve turns until something fails; the capacity is released before
    /// the error is handed back.
    pub fn serve(mut self) -> SessionError {
        let err = match self.serve_turns() {
            Ok(never) => match never {},
            Err(err) => err,
        };

        if !self.orders.is_empty() {
            debug!("{} orders still tracked when the session ended", self.orders.len());
        }
        self.capacity.release();
        err
    }

    fn serve_turns(&mut self) -> Result<Infallible, SessionError> {
        loop {
            let message = read_message(&mut *self.transport)?;

            let turn = TurnContext {
                transport: &mut *self.transport,
                orders: &mut self.orders,
                advisor: self.advisor.as_mut(),
                capacity: self.capacity.lease_mut(),
                account_currency: &self.environment.account_currency,
            };
            dispatch(message, turn)?;

            write_message(&mut *self.transport, &Message::TurnComplete)?;
        }
    }
}
