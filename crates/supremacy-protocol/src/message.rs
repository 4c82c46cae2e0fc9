//! The duplex RPC surface: requests, host messages, and the envelope.
//!
//! Exactly two enums travel on the wire:
//!
//! - [`ServiceRequest`] — everything a client can ask of the host.
//! - [`ServiceMessage`] — everything the host sends back: the two
//!   handshake responses, the `GetNewObjectId` reply, and the asynchronous
//!   push notifications.
//!
//! Both use internally tagged JSON (`#[serde(tag = "type")]`), so a request
//! looks like `{ "type": "JoinGame", "player_name": "Alice", ... }` on the
//! wire. Every message is wrapped in an [`Envelope`] carrying a per-sender
//! sequence number; envelopes travel over a reliable ordered channel, and
//! the receiver processes them strictly in `seq` order.

use serde::{Deserialize, Serialize};

use crate::{
    ChatMessage, CombatOrders, CombatTargetPrimaries, CombatTargetSecondaries,
    CombatUpdate, EmpireId, GameOptions, InvasionOrders, InvasionUpdate,
    LobbyData, ObjectId, Player, PlayerId, PlayerOrdersMessage, SlotId,
    TurnPhase,
};

/// The protocol version spoken by this build. Sent inside `JoinGame` /
/// `HostGame`; the host rejects mismatching clients with `VersionMismatch`.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Handshake results
// ---------------------------------------------------------------------------

/// Outcome of a `JoinGame` attempt. Closed enumeration: anything the host
/// cannot express here is reported as `ConnectionFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinGameResult {
    Success,
    ConnectionFailure,
    GameIsFull,
    GameAlreadyStarted,
    VersionMismatch,
}

/// Outcome of a `HostGame` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostGameResult {
    Success,
    LoadGameFailure,
    UnknownFailure,
    ServiceAlreadyRunning,
    ChannelFaultFailure,
}

/// Why a client session ended.
///
/// Exactly one reason is latched per disconnect — the first one set wins
/// and is never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientDisconnectReason {
    /// The local user chose to disconnect.
    Disconnected,
    /// The channel was closed from the remote side.
    ConnectionClosed,
    /// The channel faulted (broken pipe, protocol violation, ...).
    ConnectionBroken,
    /// The co-located host service failed to start or faulted.
    LocalServiceFailure,
    GameIsFull,
    GameAlreadyStarted,
    LoadGameFailure,
    VersionMismatch,
    UnknownFailure,
}

// ---------------------------------------------------------------------------
// Game lifecycle payloads
// ---------------------------------------------------------------------------

/// Parameters for hosting a new (or loaded) game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInitData {
    /// Display name of the hosting player.
    pub host_name: String,
    /// Initial game options; the lobby may change them before start.
    pub options: GameOptions,
    /// Saved-game file to resume, or `None` for a fresh game.
    pub saved_game: Option<String>,
}

impl GameInitData {
    /// Init data for a brand-new multiplayer game with default options.
    pub fn new_game(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            options: GameOptions::default(),
            saved_game: None,
        }
    }
}

/// Per-player payload delivered with `NotifyGameStarted`.
///
/// The snapshot bytes are the game layer's serialized starting state —
/// opaque to the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartData {
    pub turn: u32,
    pub snapshot: Vec<u8>,
}

/// Per-player payload delivered with `NotifyGameDataUpdated` after each
/// turn is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameUpdateData {
    pub turn: u32,
    pub snapshot: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ServiceRequest — client → host
// ---------------------------------------------------------------------------

/// Everything a client can ask of the host.
///
/// `HostGame` and `JoinGame` are session-initiating and answered with the
/// matching response message; `GetNewObjectId` is answered with
/// [`ServiceMessage::NewObjectId`]; everything else is one-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServiceRequest {
    /// "Start a session and make me the host."
    HostGame {
        init_data: GameInitData,
        protocol_version: u32,
    },

    /// "Let me into the running lobby."
    JoinGame {
        player_name: String,
        protocol_version: u32,
    },

    /// Chat line; `recipient_id` of `None` broadcasts.
    SendChatMessage {
        text: String,
        recipient_id: Option<PlayerId>,
    },

    /// Submit (or re-submit) this turn's full order batch.
    EndTurn { orders: PlayerOrdersMessage },

    SendCombatOrders { orders: CombatOrders },
    SendCombatTarget1 { targets: CombatTargetPrimaries },
    SendCombatTarget2 { targets: CombatTargetSecondaries },
    SendInvasionOrders { orders: InvasionOrders },

    /// The invasion screen finished animating; the invader is ready for
    /// the next round.
    NotifyInvasionScreenReady,

    /// Host-only: snapshot the session to disk.
    SaveGame { file_name: String },

    /// Host-only: replace the lobby's game options.
    UpdateGameOptions { options: GameOptions },

    /// Host-only: vacate a slot (kicks its occupant back to unassigned).
    ClearPlayerSlot { slot_id: SlotId },

    /// Host-only: close a slot so nobody can take it.
    ClosePlayerSlot { slot_id: SlotId },

    /// Host-only: seat a player in a specific slot.
    AssignPlayerSlot {
        slot_id: SlotId,
        player_id: PlayerId,
    },

    /// Host-only: leave the lobby and start the game.
    StartGame,

    /// Allocate a globally-unique object id. The only synchronous call
    /// in the protocol; answered with [`ServiceMessage::NewObjectId`].
    GetNewObjectId,

    /// Heartbeat reply, echoing the id from [`ServiceMessage::Ping`].
    Pong { ping_id: u32 },

    /// Terminate the session cleanly.
    Disconnect,
}

// ---------------------------------------------------------------------------
// ServiceMessage — host → client
// ---------------------------------------------------------------------------

/// Everything the host sends to a client: handshake responses, the object-id
/// reply, and asynchronous push notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServiceMessage {
    /// Answer to `JoinGame`. `local_player` and `lobby` are present iff
    /// `result` is `Success`.
    JoinGameResponse {
        result: JoinGameResult,
        local_player: Option<Player>,
        lobby: Option<LobbyData>,
    },

    /// Answer to `HostGame`.
    HostGameResponse {
        result: HostGameResult,
        local_player: Option<Player>,
        lobby: Option<LobbyData>,
    },

    /// Answer to `GetNewObjectId`.
    NewObjectId { object_id: ObjectId },

    /// Pushed to the joining player right after a successful join.
    NotifyOnJoin {
        local_player: Player,
        lobby: LobbyData,
    },

    /// Pushed to everyone else when a player joins.
    NotifyPlayerJoined { player: Player },

    /// Pushed when a player leaves or is dropped.
    NotifyPlayerExited { player: Player },

    /// The host is about to start the game.
    NotifyGameStarting,

    /// The game has started; per-player start data attached.
    NotifyGameStarted { start: GameStartData },

    /// Turn processing entered a new phase.
    NotifyTurnProgressChanged { phase: TurnPhase },

    /// Per-player game update after turn resolution.
    NotifyGameDataUpdated { update: GameUpdateData },

    /// Every player's orders are in; turn resolution is complete and
    /// clients should drop their local order batches.
    NotifyAllTurnEnded,

    /// The next turn is ready to play.
    NotifyTurnFinished,

    NotifyChatMessageReceived {
        sender_id: PlayerId,
        text: String,
        recipient_id: Option<PlayerId>,
    },

    /// Full lobby snapshot; replaces the client's mirror wholesale.
    NotifyLobbyUpdated { lobby: LobbyData },

    /// The host is dropping this client.
    NotifyDisconnected,

    NotifyCombatUpdate { update: CombatUpdate },
    NotifyInvasionUpdate { update: InvasionUpdate },

    /// A player (identified by empire) has submitted their orders.
    NotifyPlayerFinishedTurn { empire_id: EmpireId },

    /// Heartbeat. The client answers with [`ServiceRequest::Pong`].
    Ping { ping_id: u32 },
}

impl ServiceMessage {
    /// Returns `true` for the request/response messages that are routed to
    /// a waiting caller rather than the notification sink.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Self::JoinGameResponse { .. }
                | Self::HostGameResponse { .. }
                | Self::NewObjectId { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Direction-agnostic message content.
///
/// Adjacently tagged (`{"type": "Request", "data": {...}}`) so a receiver
/// can cheaply tell which direction's enum to expect before decoding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A client → host call.
    Request(ServiceRequest),
    /// A host → client response or push notification.
    Message(ServiceMessage),
}

/// The top-level wire format. Every message on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing per-sender sequence number. The channel is
    /// reliable and ordered; `seq` exists to detect transport bugs, not
    /// to reorder.
    pub seq: u64,
    /// Milliseconds since the sender's session started.
    pub timestamp: u64,
    /// The actual content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
