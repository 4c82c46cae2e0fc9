//! `SupremacyServer` builder and accept loop.
//!
//! This is the entry point for running a game host service. It ties the
//! layers together: transport → protocol → host actor. One server owns
//! one host actor, one WebSocket listener, and any number of in-process
//! local endpoints for the co-located hosting player.

use std::time::Duration;

use supremacy_protocol::GameOptions;
use supremacy_transport::{local_pair, Listener, LocalEndpoint, WsListener};

use crate::handler::handle_connection;
use crate::host::{spawn_host, HostHandle};
use crate::{ServiceConfig, ServiceError};

/// Builder for configuring and starting a host service.
///
/// # Example
///
/// ```rust,ignore
/// use supremacy_service::SupremacyServer;
///
/// let server = SupremacyServer::builder()
///     .bind("0.0.0.0:4455")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SupremacyServerBuilder {
    config: ServiceConfig,
}

impl SupremacyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Sets the address to bind the WebSocket listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole service configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the initial game options.
    pub fn game_options(mut self, options: GameOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Binds the listener and spawns the host actor.
    pub async fn build(self) -> Result<SupremacyServer, ServiceError> {
        let listener = WsListener::bind(&self.config.bind_addr).await?;
        let host = spawn_host(&self.config);
        Ok(SupremacyServer {
            listener,
            host,
            handshake_timeout: self.config.handshake_timeout,
        })
    }
}

impl Default for SupremacyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game host service.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SupremacyServer {
    listener: WsListener,
    host: HostHandle,
    handshake_timeout: Duration,
}

impl SupremacyServer {
    /// Creates a new builder.
    pub fn builder() -> SupremacyServerBuilder {
        SupremacyServerBuilder::new()
    }

    /// Handle to the host actor, for the embedding game layer
    /// (opening combats, reading the lobby, shutting down).
    pub fn host(&self) -> HostHandle {
        self.host.clone()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(
        &self,
    ) -> Result<std::net::SocketAddr, ServiceError> {
        Ok(self.listener.local_addr()?)
    }

    /// Opens an in-process endpoint to this service.
    ///
    /// The hosting player's client connects through the returned
    /// [`LocalEndpoint`] without touching a socket; each connection gets
    /// the same handler as a remote one.
    pub fn local_endpoint(&self) -> LocalEndpoint {
        let (mut listener, endpoint) = local_pair();
        let host = self.host.clone();
        let handshake_timeout = self.handshake_timeout;
        tokio::spawn(async move {
            while let Ok(conn) = listener.accept().await {
                tokio::spawn(handle_connection(
                    conn,
                    host.clone(),
                    handshake_timeout,
                ));
            }
        });
        endpoint
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServiceError> {
        tracing::info!("Supremacy host service running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    tokio::spawn(handle_connection(
                        conn,
                        self.host.clone(),
                        self.handshake_timeout,
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
