//! bridge-protocol
//!
//! Wire-level encoding/decoding for the terminal connection.
//!
//! This crate is responsible for turning logical terminal messages
//! (`bridge_core::Message`) into primitives on a blocking byte stream
//! and back again.
//!
//! - [`transport`]    : primitive send/receive over a blocking stream
//! - [`binary_codec`] : one message at a time, tag byte first
//! - [`wire_types`]   : tags and flag layouts
//! - [`error`]        : transport failures and protocol violations

pub mod binary_codec;
pub mod error;
pub mod transport;
pub mod wire_types;

pub use binary_codec::{read_expected, read_message, write_message, ExpectedMessage};
pub use error::{ProtocolViolation, TransportError, WireError};
pub use transport::{StreamTransport, Transport};
pub use wire_types::MessageKind;
