//! Errors that end a terminal session.
//!
//! Every session ends with exactly one [`SessionError`]; there is no
//! "normal" return because even a clean disconnect is reported as
//! [`TransportError::Closed`]. The three kinds are kept apart so the
//! accept loop can tell a flaky network from a misbehaving terminal
//! from a bug in this host.

use bridge_core::OrderId;
use bridge_protocol::{ProtocolViolation, TransportError, WireError};
use thiserror::Error;

/// The host broke one of its own bookkeeping rules.
///
/// The terminal did nothing wrong when one of these is raised.
#[derive(Debug, Clone, Error)]
pub enum InvariantViolation {
    #[error("no order event listener is registered for the order {id} ({operation})")]
    MissingListener {
        id: OrderId,
        operation: &'static str,
    },

    #[error("the expert advisor tried to {action} the order {id} which was already closed or canceled")]
    OrderAlreadyClosed { id: OrderId, action: &'static str },
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("local invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl From<WireError> for SessionError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Transport(e) => SessionError::Transport(e),
            WireError::Protocol(e) => SessionError::Protocol(e),
        }
    }
}

impl SessionError {
    /// The terminal hung up between two messages.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, SessionError::Transport(TransportError::Closed))
    }
}
