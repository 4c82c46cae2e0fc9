//! Error types for the host service.

use supremacy_protocol::ProtocolError;
use supremacy_transport::TransportError;

/// Errors that can occur in the host service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The host actor is gone; no further commands can be delivered.
    #[error("host unavailable")]
    HostUnavailable,

    /// A connection failed to complete the handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Save-game I/O failed.
    #[error("save failed: {0}")]
    Save(#[source] std::io::Error),
}
