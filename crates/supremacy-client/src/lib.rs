//! Client side of the Supremacy turn-synchronization stack.
//!
//! Layers, leaves first:
//!
//! - [`ClientEventBus`] — constructed publish/subscribe bus carrying
//!   [`ClientEvent`]s (host pushes, session lifecycle) and
//!   [`ClientCommand`]s (UI intents the session forwards to the host).
//! - Callback sink (internal) — the single-consumer scheduler that makes
//!   host notifications land in send order, never concurrently.
//! - [`PlayerOrderService`] / [`LocalOrderStore`] — the local player's
//!   per-turn order batch.
//! - [`GameClient`] — the session: owns the duplex channel, runs the
//!   handshake, forwards commands, flushes orders at end of turn, answers
//!   heartbeats, and tears down exactly once per session.

mod callback;
mod client;
mod error;
mod events;
mod orders;

pub use client::{ChannelState, GameClient};
pub use error::ClientError;
pub use events::{ClientCommand, ClientEvent, ClientEventBus};
pub use orders::{LocalOrderStore, PlayerOrderService};
