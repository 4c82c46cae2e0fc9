//! Error types for the client session.

use supremacy_protocol::{ClientDisconnectReason, ProtocolError};
use supremacy_transport::TransportError;

/// Errors that can occur in the client session.
///
/// Only session-initiating calls and `new_object_id` return these;
/// fire-and-forget operations swallow their failures by contract.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session was disposed; it cannot be used again.
    #[error("session has been disposed")]
    Disposed,

    /// A required argument was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A connection attempt while a session is already established.
    #[error("already connected")]
    AlreadyConnected,

    /// The operation requires an established session.
    #[error("not connected")]
    NotConnected,

    /// The host refused the handshake. Carries the mapped disconnect
    /// reason that was latched for the session.
    #[error("connection attempt refused: {0:?}")]
    ConnectionRefused(ClientDisconnectReason),

    /// The channel went down while a call was outstanding.
    #[error("connection lost")]
    ConnectionLost,

    /// A correlated remote call did not answer in time.
    #[error("remote call timed out")]
    CallTimeout,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
