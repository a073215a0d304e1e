//! Wire-level errors.
//!
//! Two disjoint kinds surface from this crate:
//! - [`TransportError`]: the byte stream itself failed.
//! - [`ProtocolViolation`]: the bytes arrived but break the protocol's
//!   logical contract.
//!
//! The codec returns [`WireError`], which is one or the other.
//!
//! All of them are `Clone` so a session can keep the first failure while
//! still handing it to whoever triggered it.

use std::io;
use std::sync::Arc;

use bridge_core::OrderId;
use thiserror::Error;

use crate::wire_types::MessageKind;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The peer closed the connection between two messages.
    #[error("connection closed by the terminal")]
    Closed,

    /// The peer closed the connection while a message was being read.
    #[error("connection closed in the middle of a {0} message")]
    Truncated(MessageKind),

    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    #[error("received a string that is not valid UTF-8")]
    InvalidUtf8,

    #[error("string of {0} bytes does not fit the 16 bit length prefix")]
    StringTooLong(usize),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            TransportError::Closed
        } else {
            TransportError::io(err)
        }
    }
}

impl TransportError {
    /// Wrap an I/O failure as-is, without the end-of-stream mapping.
    pub fn io(err: io::Error) -> Self {
        TransportError::Io(Arc::new(err))
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProtocolViolation {
    #[error("read the message tag {0} which is not assigned to any known message type")]
    UnknownTag(u8),

    #[error("expected the next message to be of type '{expected}' but it is of type '{actual}'")]
    UnexpectedMessage {
        expected: MessageKind,
        actual: MessageKind,
    },

    #[error("invalid value {value} in field '{field}' of a {kind} message")]
    InvalidField {
        kind: MessageKind,
        field: &'static str,
        value: i64,
    },

    #[error("received a request for the unknown trading algorithm kind {0}")]
    UnknownAlgorithmKind(u8),

    #[error("received a request for the {algorithm} with the number {number} which is unknown")]
    UnknownAlgorithm {
        algorithm: &'static str,
        number: i32,
    },

    #[error(
        "received a message that the order {id} was {event} but no open order with this id was placed on this connection"
    )]
    UnknownOrder { id: OrderId, event: &'static str },

    #[error("received a message of type '{kind}' which is not expected {context}")]
    NotExpected {
        kind: MessageKind,
        context: &'static str,
    },
}

/// Error produced while reading or writing one message.
#[derive(Debug, Clone, Error)]
pub enum WireError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
}

impl WireError {
    pub fn is_closed(&self) -> bool {
        matches!(self, WireError::Transport(TransportError::Closed))
    }
}
