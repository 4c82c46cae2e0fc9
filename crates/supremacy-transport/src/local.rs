//! In-process channel for the hosting player.
//!
//! When a player hosts a game, their own client and the game service live
//! in the same process. Routing that traffic through a socket would add
//! latency and a failure mode for nothing, so the local flavor is a pair
//! of crossed in-memory queues with the same semantics as the WebSocket
//! channel: reliable, ordered, `Ok(None)` on clean close.

use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::{next_connection_id, Connection, ConnectionId, Listener, TransportError};

/// Creates a local listener and the endpoint used to dial it.
///
/// The service side holds the [`LocalListener`] and treats it like any
/// other listener; the [`LocalEndpoint`] is cloneable and handed to
/// whichever client should connect in-process.
pub fn local_pair() -> (LocalListener, LocalEndpoint) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    (
        LocalListener { accept_rx },
        LocalEndpoint { accept_tx },
    )
}

/// Accepts in-process connections. See [`local_pair`].
pub struct LocalListener {
    accept_rx: mpsc::UnboundedReceiver<LocalConnection>,
}

impl Listener for LocalListener {
    type Connection = LocalConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        // None = every endpoint handle has been dropped.
        self.accept_rx.recv().await.ok_or(TransportError::Shutdown)
    }
}

/// Cloneable dialing handle for a [`LocalListener`].
#[derive(Clone)]
pub struct LocalEndpoint {
    accept_tx: mpsc::UnboundedSender<LocalConnection>,
}

impl LocalEndpoint {
    /// Establishes a new in-process connection.
    ///
    /// # Errors
    /// Returns `TransportError::Shutdown` if the listener is gone.
    pub fn connect(&self) -> Result<LocalConnection, TransportError> {
        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();

        let server_side = LocalConnection::new(server_tx, server_rx);
        let client_side = LocalConnection::new(client_tx, client_rx);

        self.accept_tx
            .send(server_side)
            .map_err(|_| TransportError::Shutdown)?;
        tracing::debug!(id = %client_side.id(), "established local connection");
        Ok(client_side)
    }
}

/// One side of an in-process duplex channel.
pub struct LocalConnection {
    id: ConnectionId,
    // Taken on close so the peer's recv sees end-of-stream.
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl LocalConnection {
    fn new(
        tx: mpsc::UnboundedSender<Vec<u8>>,
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: next_connection_id(),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
        }
    }
}

impl Connection for LocalConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let guard = self.tx.lock().await;
        let tx = guard
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionClosed("local channel closed".into()))?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("local peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        // None = the peer's sender was dropped or closed: clean close.
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tx.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_connect_and_exchange() {
        let (mut listener, endpoint) = local_pair();

        let client = endpoint.connect().expect("listener alive");
        let server = listener.accept().await.expect("accept");

        client.send(b"to server").await.unwrap();
        assert_eq!(server.recv().await.unwrap().unwrap(), b"to server");

        server.send(b"to client").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"to client");
    }

    #[tokio::test]
    async fn test_local_recv_returns_none_after_peer_close() {
        let (mut listener, endpoint) = local_pair();
        let client = endpoint.connect().unwrap();
        let server = listener.accept().await.unwrap();

        client.close().await.unwrap();
        assert!(server.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_send_after_close_fails() {
        let (mut listener, endpoint) = local_pair();
        let client = endpoint.connect().unwrap();
        let _server = listener.accept().await.unwrap();

        client.close().await.unwrap();
        assert!(client.send(b"late").await.is_err());
    }

    #[tokio::test]
    async fn test_local_message_order_preserved() {
        let (mut listener, endpoint) = local_pair();
        let client = endpoint.connect().unwrap();
        let server = listener.accept().await.unwrap();

        for i in 0u8..10 {
            client.send(&[i]).await.unwrap();
        }
        for i in 0u8..10 {
            assert_eq!(server.recv().await.unwrap().unwrap(), vec![i]);
        }
    }

    #[tokio::test]
    async fn test_connect_fails_after_listener_dropped() {
        let (listener, endpoint) = local_pair();
        drop(listener);
        assert!(endpoint.connect().is_err());
    }
}
