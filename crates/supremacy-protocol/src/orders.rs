//! Order batches, combat directives, invasion directives, and chat.
//!
//! These are the payloads a client submits during a turn. The turn-sync
//! layer treats the contents of an [`Order`] as opaque — what constitutes
//! a valid fleet or colony order is game logic, not protocol. Combat and
//! invasion directives, by contrast, are fully typed because the host
//! gates them on encounter state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CombatId, EmpireId, ObjectId, PlayerId};

// ---------------------------------------------------------------------------
// Turn orders
// ---------------------------------------------------------------------------

/// One order issued against one game object.
///
/// The `directive` bytes are produced and consumed by the game layer's own
/// codec; the sync layer only guarantees they arrive intact and in batch
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// The object this order applies to.
    pub object_id: ObjectId,
    /// Opaque, game-defined directive payload.
    pub directive: Vec<u8>,
}

/// A single player's complete order batch for one turn.
///
/// Sent via `EndTurn`. The client pushes the *full* current batch on every
/// change once the local turn has ended; the host keeps only the last batch
/// received per player, so intermediate sends are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOrdersMessage {
    /// The turn these orders apply to.
    pub turn: u32,
    /// All orders accumulated this turn, in submission order.
    pub orders: Vec<Order>,
    /// The player's auto-turn preference, carried with every batch so the
    /// game layer can act on it; the sync layer only transports it.
    pub auto_turn: bool,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// A participant's directive for one of their assets in an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOrder {
    /// Close and fight.
    Engage,
    /// Withdraw from the encounter.
    Retreat,
    /// Charge the enemy line.
    Rush,
    /// Attempt to open communications instead of firing.
    Hail,
}

/// A participant's full set of directives for one combat encounter.
///
/// Keyed by [`CombatId`]; the host accepts these only while the encounter
/// is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOrders {
    pub combat_id: CombatId,
    /// The player submitting these orders.
    pub owner_id: PlayerId,
    /// Per-asset directives.
    pub orders: HashMap<ObjectId, CombatOrder>,
}

/// Primary target selection: which civilization each asset should focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTargetPrimaries {
    pub combat_id: CombatId,
    pub owner_id: PlayerId,
    pub targets: HashMap<ObjectId, EmpireId>,
}

/// Secondary (fallback) target selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTargetSecondaries {
    pub combat_id: CombatId,
    pub owner_id: PlayerId,
    pub targets: HashMap<ObjectId, EmpireId>,
}

/// Host → participants update for a combat encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUpdate {
    pub combat_id: CombatId,
    /// Round counter within the encounter, starting at 1.
    pub round: u32,
    /// `true` once the encounter has been resolved; no further orders are
    /// accepted after this.
    pub resolved: bool,
    /// Empires taking part in the encounter.
    pub participants: Vec<EmpireId>,
}

// ---------------------------------------------------------------------------
// Invasion
// ---------------------------------------------------------------------------

/// What the invading player wants to do this invasion round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvasionAction {
    StandBy,
    BombardPlanet,
    UnloadAllOrdnance,
    LandTroops,
    StandDown,
}

/// The invader's directives for one invasion round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvasionOrders {
    pub invasion_id: ObjectId,
    pub action: InvasionAction,
    /// The units committed to this round's action.
    pub selected_units: Vec<ObjectId>,
}

/// Host → invader update for an invasion in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvasionUpdate {
    pub invasion_id: ObjectId,
    pub round: u32,
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A chat line as it travels on the wire.
///
/// `recipient_id` of `None` means broadcast to everyone. Ordering is
/// best-effort: delivery order is host arrival order, with no sequence
/// numbers of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: PlayerId,
    pub text: String,
    /// `None` = broadcast, `Some(id)` = whisper to one player.
    pub recipient_id: Option<PlayerId>,
}

impl ChatMessage {
    /// Returns `true` if this message goes to every player.
    pub fn is_broadcast(&self) -> bool {
        self.recipient_id.is_none()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_orders_message_round_trip() {
        let msg = PlayerOrdersMessage {
            turn: 3,
            orders: vec![Order {
                object_id: ObjectId(40),
                directive: vec![1, 2, 3],
            }],
            auto_turn: false,
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: PlayerOrdersMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_empty_order_batch_round_trip() {
        // A turn with no orders at all is still a valid batch.
        let msg = PlayerOrdersMessage {
            turn: 1,
            orders: vec![],
            auto_turn: true,
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: PlayerOrdersMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_combat_orders_round_trip() {
        let mut orders = HashMap::new();
        orders.insert(ObjectId(10), CombatOrder::Engage);
        orders.insert(ObjectId(11), CombatOrder::Retreat);

        let co = CombatOrders {
            combat_id: CombatId(5),
            owner_id: PlayerId(1),
            orders,
        };
        let bytes = serde_json::to_vec(&co).unwrap();
        let decoded: CombatOrders = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(co, decoded);
    }

    #[test]
    fn test_combat_target_selection_round_trip() {
        let mut targets = HashMap::new();
        targets.insert(ObjectId(10), EmpireId(2));

        let primaries = CombatTargetPrimaries {
            combat_id: CombatId(5),
            owner_id: PlayerId(1),
            targets: targets.clone(),
        };
        let bytes = serde_json::to_vec(&primaries).unwrap();
        let decoded: CombatTargetPrimaries = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(primaries, decoded);

        let secondaries = CombatTargetSecondaries {
            combat_id: CombatId(5),
            owner_id: PlayerId(1),
            targets,
        };
        let bytes = serde_json::to_vec(&secondaries).unwrap();
        let decoded: CombatTargetSecondaries = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(secondaries, decoded);
    }

    #[test]
    fn test_invasion_orders_round_trip() {
        let orders = InvasionOrders {
            invasion_id: ObjectId(77),
            action: InvasionAction::LandTroops,
            selected_units: vec![ObjectId(1), ObjectId(2)],
        };
        let bytes = serde_json::to_vec(&orders).unwrap();
        let decoded: InvasionOrders = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(orders, decoded);
    }

    #[test]
    fn test_chat_message_broadcast_has_null_recipient() {
        let msg = ChatMessage {
            sender_id: PlayerId(1),
            text: "hello all".into(),
            recipient_id: None,
        };
        assert!(msg.is_broadcast());

        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert!(json["recipient_id"].is_null());
    }

    #[test]
    fn test_chat_message_whisper_round_trip() {
        let msg = ChatMessage {
            sender_id: PlayerId(1),
            text: "psst".into(),
            recipient_id: Some(PlayerId(2)),
        };
        assert!(!msg.is_broadcast());
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ChatMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }
}
