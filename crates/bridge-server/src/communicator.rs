//! Front door of every terminal connection.

use bridge_core::{AlgorithmKind, SelectAlgorithm};
use bridge_protocol::{read_expected, Transport, TransportError};
use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::session::{run_indicator, ExpertAdvisorSession};
use crate::types::{ClientId, HostServices};

/// Read the terminal's algorithm selection and serve the matching session
/// until it ends. Returns why it ended.
pub fn serve_connection<T: Transport + ?Sized>(
    transport: &mut T,
    services: &HostServices,
) -> SessionError {
    let selection: SelectAlgorithm = match read_expected(&mut *transport) {
        Ok(selection) => selection,
        Err(err) => return err.into(),
    };

    match selection.kind {
        AlgorithmKind::ExpertAdvisor => {
            info!("terminal selected expert advisor {}", selection.number);
            match ExpertAdvisorSession::handshake(
                transport,
                selection.number,
                services.advisors.as_ref(),
                services.capacity.as_ref(),
            ) {
                Ok(session) => session.serve(),
                Err(err) => err,
            }
        }
        AlgorithmKind::Indicator => {
            info!("terminal selected indicator {}", selection.number);
            run_indicator(transport, selection.number, services.indicators.as_ref())
        }
    }
}

/// Log how a session ended, at a level matching whose fault it was.
pub fn report_ending(client_id: ClientId, err: &SessionError) {
    match err {
        SessionError::Transport(TransportError::Closed) => {
            info!("client {} disconnected", client_id.0);
        }
        SessionError::Transport(e) => {
            warn!("client {} lost: {}", client_id.0, e);
        }
        SessionError::Protocol(e) => {
            warn!("client {} broke the protocol: {}", client_id.0, e);
        }
        SessionError::Invariant(e) => {
            error!("client {} session aborted by a host bug: {}", client_id.0, e);
        }
    }
}
