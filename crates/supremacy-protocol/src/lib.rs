//! Wire protocol for the Supremacy turn-synchronization stack.
//!
//! This crate defines the language clients and the host service speak:
//!
//! - **Types** ([`Player`], [`LobbyData`], [`PlayerOrdersMessage`], etc.)
//!   — the data structures that travel on the wire.
//! - **Messages** ([`ServiceRequest`], [`ServiceMessage`], [`Envelope`])
//!   — the duplex RPC surface.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (player identity). It doesn't know about connections or lobbies — it
//! only knows how to describe and serialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (player context)
//! ```

mod codec;
mod error;
mod message;
mod orders;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientDisconnectReason, Envelope, GameInitData, GameStartData,
    GameUpdateData, HostGameResult, JoinGameResult, Payload, ServiceMessage,
    ServiceRequest, PROTOCOL_VERSION,
};
pub use orders::{
    ChatMessage, CombatOrder, CombatOrders, CombatTargetPrimaries,
    CombatTargetSecondaries, CombatUpdate, InvasionAction, InvasionOrders,
    InvasionUpdate, Order, PlayerOrdersMessage,
};
pub use types::{
    CombatId, EmpireId, GalaxySize, GameOptions, LobbyData, ObjectId, Player,
    PlayerId, PlayerSlot, SlotClaim, SlotId, SlotStatus, TurnPhase,
};
