//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts terminal connections up to `max_clients`.
//! - Assigns each connection a `ClientId`.
//! - Hands each connection to a blocking thread running its session.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::client;
use crate::config::Config;
use crate::types::{ClientId, HostServices};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    ClientId(id)
}

/// Frees a connection slot when the session thread finishes, even by panic.
struct ActiveSlot(Arc<AtomicUsize>);

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run the TCP server with the given configuration. Only returns on a
/// listener failure.
pub async fn run(config: Config, services: HostServices) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("listening for terminals on {}", addr);

    serve(listener, config, services).await
}

/// Accept loop over an already bound listener.
pub async fn serve(
    listener: TcpListener,
    config: Config,
    services: HostServices,
) -> anyhow::Result<()> {
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer_addr) = listener.accept().await.context("accepting a terminal")?;

        if active.load(Ordering::SeqCst) >= config.max_clients {
            warn!(
                "rejecting connection from {}: max_clients ({}) reached",
                peer_addr, config.max_clients
            );
            continue;
        }

        let client_id = next_client_id();
        let stream = match into_blocking(stream) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("dropping connection from {}: {}", peer_addr, e);
                continue;
            }
        };
        info!("accepted terminal {} from {}", client_id.0, peer_addr);

        active.fetch_add(1, Ordering::SeqCst);
        let slot = ActiveSlot(Arc::clone(&active));
        let services = services.clone();
        let read_timeout = config.read_timeout();

        tokio::task::spawn_blocking(move || {
            let _slot = slot;
            client::run_client(client_id, stream, &services, read_timeout);
        });
    }
}

fn into_blocking(stream: TcpStream) -> std::io::Result<std::net::TcpStream> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;
    Ok(stream)
}
