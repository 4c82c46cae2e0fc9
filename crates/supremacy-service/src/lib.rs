//! Authoritative host service for the Supremacy turn-synchronization
//! stack.
//!
//! The service owns the session: lobby slots, the player roster, order
//! collection, combat gating, and turn resolution. All of that state
//! lives inside a single host actor task; connection handlers and the
//! heartbeat loop talk to it over a command channel, so there is exactly
//! one writer and no locks.
//!
//! ```text
//! WsListener ──┐
//!              ├─ handler task per connection ── HostHandle ── host actor
//! LocalEndpoint┘
//! ```
//!
//! Start one with [`SupremacyServer::builder`]; the hosting player's own
//! client attaches through [`SupremacyServer::local_endpoint`] while
//! remote players dial the WebSocket listener.

mod config;
mod error;
mod handler;
mod host;
mod server;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use host::{spawn_host, HostHandle, PlayerSender};
pub use server::{SupremacyServer, SupremacyServerBuilder};
