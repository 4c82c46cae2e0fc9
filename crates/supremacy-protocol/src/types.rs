//! Identity types and the lobby data model.
//!
//! Everything in this module travels on the wire between a game client and
//! the host, so each type derives `Serialize`/`Deserialize` and the JSON
//! shape is pinned down by tests. The lobby model is snapshot-based: the
//! host sends a complete [`LobbyData`] on every change rather than diffs,
//! and clients replace their mirror wholesale.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player within one game session.
///
/// Newtype over `i32` — the sign matters. Non-negative ids are human
/// players (the host is always id 0); negative ids are reserved sentinels
/// for slots that are not backed by a live connection.
///
/// `#[serde(transparent)]` keeps the wire form a plain number, so
/// `PlayerId(3)` serializes as `3`, not `{"0":3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// The player id of the game host.
    pub const GAME_HOST: PlayerId = PlayerId(0);
    /// Sentinel for a slot with no player assigned.
    pub const UNASSIGNED: PlayerId = PlayerId(-1);
    /// Sentinel for a slot driven by the computer.
    pub const COMPUTER: PlayerId = PlayerId(-2);

    /// Returns `true` if this id belongs to a human player
    /// (host included).
    pub fn is_human(self) -> bool {
        self.0 >= Self::GAME_HOST.0
    }

    /// Returns `true` if this id is the game host's.
    pub fn is_game_host(self) -> bool {
        self == Self::GAME_HOST
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for an empire (civilization) in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmpireId(pub i32);

impl EmpireId {
    /// The value used before a player has picked an empire.
    pub const INVALID: EmpireId = EmpireId(-1);

    /// Returns `true` if an empire has actually been selected.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for EmpireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// A globally-unique identifier for a game object (ship, colony, ...).
///
/// Allocated exclusively by the host (see `GetNewObjectId`), so two clients
/// can never mint the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub i32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O-{}", self.0)
    }
}

/// A unique identifier for one combat encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatId(pub i32);

impl fmt::Display for CombatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Index of a lobby slot. Slots are dense: 0..max_players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u8);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player as the host sees them: identity plus empire assignment.
///
/// Created by the host on join; referenced by [`PlayerId`] everywhere else
/// (slots in particular never hold a `Player` by value across the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Host-assigned identity, stable for the lifetime of the session.
    pub player_id: PlayerId,
    /// Display name as given at join time.
    pub name: String,
    /// Selected empire, or [`EmpireId::INVALID`] before selection.
    pub empire_id: EmpireId,
}

impl Player {
    /// Creates a player with no empire selected yet.
    pub fn new(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            empire_id: EmpireId::INVALID,
        }
    }

    /// The "Unassigned" placeholder player.
    pub fn unassigned() -> Self {
        Self::new(PlayerId::UNASSIGNED, "Unassigned")
    }

    /// The "Computer" placeholder player.
    pub fn computer() -> Self {
        Self::new(PlayerId::COMPUTER, "Computer")
    }

    /// Returns `true` if this player is the game host.
    pub fn is_game_host(&self) -> bool {
        self.player_id.is_game_host()
    }

    /// Returns `true` if this player is driven by a human.
    pub fn is_human(&self) -> bool {
        self.player_id.is_human()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.player_id)
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// The occupancy state of a lobby slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Vacant, joinable by the next player.
    Open,
    /// Driven by the computer.
    Computer,
    /// Closed by the host; not joinable.
    Closed,
    /// Occupied by a human player.
    Taken,
}

/// Whether a slot has been claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotClaim {
    Unassigned,
    Assigned,
}

/// One seat in the lobby.
///
/// Slots reference players by id, never by value — the roster in
/// [`LobbyData::players`] is the single source for player details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub slot_id: SlotId,
    pub status: SlotStatus,
    pub claim: SlotClaim,
    /// The occupying player, if any. `Some` implies `status == Taken`.
    pub player_id: Option<PlayerId>,
    /// The empire this slot plays, or [`EmpireId::INVALID`].
    pub empire_id: EmpireId,
}

impl PlayerSlot {
    /// Creates an open, unclaimed slot.
    pub fn open(slot_id: SlotId, empire_id: EmpireId) -> Self {
        Self {
            slot_id,
            status: SlotStatus::Open,
            claim: SlotClaim::Unassigned,
            player_id: None,
            empire_id,
        }
    }

    /// Returns `true` if a new player could take this slot.
    pub fn is_vacant(&self) -> bool {
        matches!(self.status, SlotStatus::Open)
    }
}

// ---------------------------------------------------------------------------
// Game options
// ---------------------------------------------------------------------------

/// Galaxy size selected at game setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GalaxySize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

/// The game options agreed on in the lobby.
///
/// Owned by the host; clients propose changes via `UpdateGameOptions` and
/// receive the authoritative copy back inside the next lobby snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    pub galaxy_size: GalaxySize,
    /// Number of lobby slots the host creates.
    pub max_players: u8,
    /// Seconds a player has to submit orders, 0 = untimed.
    pub turn_timer_secs: u32,
    /// Seconds a combat participant has to submit orders, 0 = untimed.
    pub combat_timer_secs: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            galaxy_size: GalaxySize::default(),
            max_players: 4,
            turn_timer_secs: 0,
            combat_timer_secs: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// LobbyData
// ---------------------------------------------------------------------------

/// A complete snapshot of lobby state at one point in time.
///
/// Immutable value, exchanged wholesale — there is no incremental diffing.
/// Invariant: a player appears in at most one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyData {
    /// Every player currently in the session, host first.
    pub players: Vec<Player>,
    /// All slots, dense by [`SlotId`].
    pub slots: Vec<PlayerSlot>,
    /// Authoritative game options.
    pub options: GameOptions,
    /// `true` once `StartGame` has taken effect.
    pub game_started: bool,
}

impl LobbyData {
    /// Looks up a player by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == id)
    }

    /// Returns the slot occupied by `id`, if any.
    pub fn slot_of(&self, id: PlayerId) -> Option<&PlayerSlot> {
        self.slots.iter().find(|s| s.player_id == Some(id))
    }

    /// Returns `true` if at least one slot is still open.
    pub fn has_open_slot(&self) -> bool {
        self.slots.iter().any(PlayerSlot::is_vacant)
    }
}

// ---------------------------------------------------------------------------
// Turn phases
// ---------------------------------------------------------------------------

/// The phase the host is currently processing within one turn.
///
/// Pushed to clients via `NotifyTurnProgressChanged` so the UI can show
/// progress while the host resolves the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the remaining players to submit orders.
    WaitOnPlayers,
    PreTurnOperations,
    FleetMovement,
    Combat,
    Production,
    Research,
    Diplomacy,
    /// Sending per-player game updates back out.
    SendUpdates,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means PlayerId(3) → `3`, not `{"0":3}`.
        let json = serde_json::to_string(&PlayerId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_player_id_sentinels() {
        assert!(PlayerId::GAME_HOST.is_human());
        assert!(PlayerId::GAME_HOST.is_game_host());
        assert!(!PlayerId::UNASSIGNED.is_human());
        assert!(!PlayerId::COMPUTER.is_human());
        assert!(!PlayerId(1).is_game_host());
        assert!(PlayerId(1).is_human());
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(EmpireId(2).to_string(), "E-2");
        assert_eq!(ObjectId(40).to_string(), "O-40");
        assert_eq!(CombatId(5).to_string(), "C-5");
        assert_eq!(SlotId(1).to_string(), "S-1");
    }

    #[test]
    fn test_empire_id_invalid_is_not_valid() {
        assert!(!EmpireId::INVALID.is_valid());
        assert!(EmpireId(0).is_valid());
    }

    #[test]
    fn test_player_new_has_no_empire() {
        let p = Player::new(PlayerId(1), "Alice");
        assert_eq!(p.empire_id, EmpireId::INVALID);
        assert!(p.is_human());
        assert!(!p.is_game_host());
    }

    #[test]
    fn test_player_placeholders() {
        assert!(!Player::unassigned().is_human());
        assert!(!Player::computer().is_human());
    }

    #[test]
    fn test_player_round_trip() {
        let p = Player::new(PlayerId::GAME_HOST, "Host");
        let bytes = serde_json::to_vec(&p).unwrap();
        let decoded: Player = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn test_slot_open_is_vacant() {
        let slot = PlayerSlot::open(SlotId(0), EmpireId(0));
        assert!(slot.is_vacant());
        assert_eq!(slot.claim, SlotClaim::Unassigned);
        assert!(slot.player_id.is_none());
    }

    #[test]
    fn test_lobby_data_lookups() {
        let host = Player::new(PlayerId::GAME_HOST, "Host");
        let mut slot = PlayerSlot::open(SlotId(0), EmpireId(0));
        slot.status = SlotStatus::Taken;
        slot.claim = SlotClaim::Assigned;
        slot.player_id = Some(host.player_id);

        let lobby = LobbyData {
            players: vec![host.clone()],
            slots: vec![slot, PlayerSlot::open(SlotId(1), EmpireId(1))],
            options: GameOptions::default(),
            game_started: false,
        };

        assert_eq!(lobby.player(PlayerId::GAME_HOST), Some(&host));
        assert!(lobby.player(PlayerId(9)).is_none());
        assert_eq!(
            lobby.slot_of(PlayerId::GAME_HOST).map(|s| s.slot_id),
            Some(SlotId(0))
        );
        assert!(lobby.has_open_slot());
    }

    #[test]
    fn test_lobby_data_round_trip() {
        let lobby = LobbyData {
            players: vec![Player::new(PlayerId::GAME_HOST, "Host")],
            slots: vec![PlayerSlot::open(SlotId(0), EmpireId(0))],
            options: GameOptions::default(),
            game_started: false,
        };
        let bytes = serde_json::to_vec(&lobby).unwrap();
        let decoded: LobbyData = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(lobby, decoded);
    }

    #[test]
    fn test_game_options_default() {
        let options = GameOptions::default();
        assert_eq!(options.max_players, 4);
        assert_eq!(options.galaxy_size, GalaxySize::Medium);
        assert_eq!(options.turn_timer_secs, 0);
    }

    #[test]
    fn test_turn_phase_round_trip() {
        let phase = TurnPhase::FleetMovement;
        let bytes = serde_json::to_vec(&phase).unwrap();
        let decoded: TurnPhase = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(phase, decoded);
    }
}
