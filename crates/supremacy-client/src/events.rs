//! The client event bus: a constructed publish/subscribe object.
//!
//! Host-originated notifications surface here as [`ClientEvent`]s, and
//! UI-originated intents travel the other way as [`ClientCommand`]s that
//! the session forwards to the host. The bus is an ordinary value passed
//! by reference, not a process-wide static hub, so every test can build
//! its own isolated bus.
//!
//! Fan-out is per-subscriber FIFO: each subscriber gets its own unbounded
//! queue, and a single publisher sees its publications delivered to every
//! live subscriber in publication order.

use std::sync::{Arc, Mutex};

use supremacy_protocol::{
    ChatMessage, ClientDisconnectReason, CombatOrders, CombatTargetPrimaries,
    CombatTargetSecondaries, CombatUpdate, EmpireId, GameOptions,
    GameStartData, GameUpdateData, InvasionOrders, InvasionUpdate, LobbyData,
    Player, PlayerId, SlotId, TurnPhase,
};
use tokio::sync::mpsc;

/// Something that happened to the session or was pushed by the host.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A channel to the host was opened (handshake may still be pending).
    Connected,
    /// The local player was admitted to the lobby.
    LocalPlayerJoined { player: Player, lobby: LobbyData },
    PlayerJoined(Player),
    PlayerExited(Player),
    GameStarting,
    GameStarted(GameStartData),
    TurnPhaseChanged(TurnPhase),
    GameUpdateReceived(GameUpdateData),
    /// The next turn is ready to play (the host finished the previous one).
    TurnStarted,
    /// The local player ended their turn. Published by the game layer;
    /// the session reacts by flushing the current order batch.
    TurnEnded,
    /// Every player's orders are in; local orders are about to be cleared.
    AllTurnEnded,
    ChatMessageReceived(ChatMessage),
    /// Full lobby snapshot replacing the local mirror.
    LobbyUpdated(LobbyData),
    /// The host pinged us; the session answers with a pong.
    ServerHeartbeat { ping_id: u32 },
    CombatUpdateReceived(CombatUpdate),
    InvasionUpdateReceived(InvasionUpdate),
    PlayerTurnFinished { empire_id: EmpireId },
    /// Terminal: fired exactly once per session.
    Disconnected(ClientDisconnectReason),
}

/// A UI-originated intent the session forwards to the host.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    SendChatMessage {
        text: String,
        recipient_id: Option<PlayerId>,
    },
    SendCombatOrders(CombatOrders),
    SendCombatTarget1(CombatTargetPrimaries),
    SendCombatTarget2(CombatTargetSecondaries),
    SendInvasionOrders(InvasionOrders),
    /// The invasion screen finished; tell the host we're ready.
    EndInvasion,
    SaveGame(String),
    AssignPlayerSlot { slot_id: SlotId, player_id: PlayerId },
    ClearPlayerSlot(SlotId),
    ClosePlayerSlot(SlotId),
    StartGame,
    UpdateGameOptions(GameOptions),
}

/// Cheap-to-clone handle to a pair of broadcast channels (events and
/// commands). See the module docs for the delivery guarantees.
#[derive(Clone, Default)]
pub struct ClientEventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    events: Mutex<Vec<mpsc::UnboundedSender<ClientEvent>>>,
    commands: Mutex<Vec<mpsc::UnboundedSender<ClientCommand>>>,
}

impl ClientEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new event subscriber.
    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.events.lock().unwrap().push(tx);
        rx
    }

    /// Registers a new command subscriber.
    pub fn subscribe_commands(
        &self,
    ) -> mpsc::UnboundedReceiver<ClientCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.commands.lock().unwrap().push(tx);
        rx
    }

    /// Delivers an event to every live subscriber, pruning dead ones.
    pub fn publish_event(&self, event: ClientEvent) {
        let mut subscribers = self.inner.events.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Delivers a command to every live subscriber, pruning dead ones.
    pub fn publish_command(&self, command: ClientCommand) {
        let mut subscribers = self.inner.commands.lock().unwrap();
        subscribers.retain(|tx| tx.send(command.clone()).is_ok());
    }

    /// Number of live event subscribers. Diagnostic only.
    pub fn event_subscriber_count(&self) -> usize {
        self.inner.events.lock().unwrap().len()
    }

    /// Number of live command subscribers. Diagnostic only.
    pub fn command_subscriber_count(&self) -> usize {
        self.inner.commands.lock().unwrap().len()
    }
}
