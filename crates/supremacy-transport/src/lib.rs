//! Duplex channel abstraction for the Supremacy turn-synchronization stack.
//!
//! A game session needs exactly one kind of pipe: a reliable, ordered,
//! bidirectional message channel between a client and the host service.
//! This crate provides that pipe in two flavors behind one interface:
//!
//! - [`WsConnection`] — a WebSocket channel for remote play
//!   (via `tokio-tungstenite`), accepted by a [`WsListener`] on the
//!   service side or dialed with [`connect_remote`] on the client side.
//! - [`LocalConnection`] — an in-process channel for the player who is
//!   hosting: their client talks to the co-located service without
//!   touching a socket.
//!
//! [`DuplexChannel`] is the client-side handle that erases the
//! distinction; the service side stays generic over [`Connection`].
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod local;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use local::{local_pair, LocalConnection, LocalEndpoint, LocalListener};
#[cfg(feature = "websocket")]
pub use websocket::{connect_remote, WsConnection, WsListener};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// The port a Supremacy service listens on when none is configured.
pub const DEFAULT_PORT: u16 = 4455;

/// Counter for generating unique connection IDs.
///
/// Shared by every connection flavor so a service that accepts both
/// local and remote channels can key them in one map.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_connection_id() -> ConnectionId {
    ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where to find a game service.
#[derive(Clone)]
pub enum ServiceAddress {
    /// A service running in this process, reachable through its
    /// [`LocalEndpoint`].
    Local(LocalEndpoint),
    /// A service on the network.
    Remote { host: String, port: u16 },
}

impl ServiceAddress {
    /// A remote address on the default port.
    pub fn remote(host: impl Into<String>) -> Self {
        Self::Remote {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Debug for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(_) => write!(f, "Local"),
            Self::Remote { host, port } => {
                write!(f, "Remote({host}:{port})")
            }
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(_) => write!(f, "local"),
            Self::Remote { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Accepts new incoming connections on the service side.
pub trait Listener: Send + 'static {
    /// The connection type produced by this listener.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single reliable, ordered, bidirectional message channel.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

// ---------------------------------------------------------------------------
// DuplexChannel
// ---------------------------------------------------------------------------

/// The client side's handle to whichever channel it dialed.
///
/// Remote and local play share every code path above this point; the
/// session layer holds a `DuplexChannel` and never asks which kind it is.
pub enum DuplexChannel {
    #[cfg(feature = "websocket")]
    Remote(WsConnection<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>),
    Local(LocalConnection),
}

impl Connection for DuplexChannel {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        match self {
            #[cfg(feature = "websocket")]
            Self::Remote(conn) => conn.send(data).await,
            Self::Local(conn) => conn.send(data).await,
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match self {
            #[cfg(feature = "websocket")]
            Self::Remote(conn) => conn.recv().await,
            Self::Local(conn) => conn.recv().await,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self {
            #[cfg(feature = "websocket")]
            Self::Remote(conn) => conn.close().await,
            Self::Local(conn) => conn.close().await,
        }
    }

    fn id(&self) -> ConnectionId {
        match self {
            #[cfg(feature = "websocket")]
            Self::Remote(conn) => conn.id(),
            Self::Local(conn) => conn.id(),
        }
    }
}

/// Dials the given address and returns the established channel.
#[cfg(feature = "websocket")]
pub async fn connect(
    address: &ServiceAddress,
) -> Result<DuplexChannel, TransportError> {
    match address {
        ServiceAddress::Local(endpoint) => {
            Ok(DuplexChannel::Local(endpoint.connect()?))
        }
        ServiceAddress::Remote { host, port } => {
            Ok(DuplexChannel::Remote(connect_remote(host, *port).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_remote_address_uses_default_port() {
        let addr = ServiceAddress::remote("play.example.net");
        match addr {
            ServiceAddress::Remote { host, port } => {
                assert_eq!(host, "play.example.net");
                assert_eq!(port, DEFAULT_PORT);
            }
            ServiceAddress::Local(_) => panic!("expected remote"),
        }
    }

    #[test]
    fn test_service_address_display() {
        let addr = ServiceAddress::Remote {
            host: "10.0.0.5".into(),
            port: 4455,
        };
        assert_eq!(addr.to_string(), "10.0.0.5:4455");
    }
}
