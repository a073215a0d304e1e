//! Blocking handler for a single terminal connection.
//!
//! Runs on a dedicated blocking thread: the protocol is strictly
//! request/response and a session never does two things at once.

use std::net::TcpStream;
use std::time::Duration;

use bridge_protocol::StreamTransport;
use tracing::{info_span, warn};

use crate::communicator::{report_ending, serve_connection};
use crate::types::{ClientId, HostServices};

/// Serve `stream` until its session ends, then log why.
pub fn run_client(
    client_id: ClientId,
    stream: TcpStream,
    services: &HostServices,
    read_timeout: Option<Duration>,
) {
    let _span = info_span!("client", id = client_id.0).entered();

    if let Err(e) = stream.set_nodelay(true) {
        warn!("client {}: could not disable Nagle: {}", client_id.0, e);
    }
    if let Err(e) = stream.set_read_timeout(read_timeout) {
        warn!("client {}: could not set read timeout: {}", client_id.0, e);
    }

    let mut transport = match StreamTransport::from_tcp(stream) {
        Ok(transport) => transport,
        Err(e) => {
            warn!("client {}: could not split stream: {}", client_id.0, e);
            return;
        }
    };

    let ending = serve_connection(&mut transport, services);
    report_ending(client_id, &ending);
}
