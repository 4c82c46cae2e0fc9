//! Host actor: an isolated tokio task that owns all lobby and game state.
//!
//! The actor is the single writer for the roster, slots, order map, and
//! combat bookkeeping; the outside world (connection handlers, the
//! heartbeat loop, the embedding game layer) talks to it through an mpsc
//! command channel and gets replies over oneshots. No shared mutable
//! state, no locks.
//!
//! Turn model: every player submits a full order batch via `EndTurn`; the
//! last batch received per player wins. When every connected player has
//! submitted, the turn is processed: phase notifications stream out, open
//! combat encounters resolve, per-player game updates go out, and the
//! order map is cleared for the next turn.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use supremacy_protocol::{
    CombatId, CombatOrders, CombatTargetPrimaries, CombatTargetSecondaries,
    CombatUpdate, EmpireId, GameInitData, GameOptions, GameStartData,
    GameUpdateData, HostGameResult, InvasionUpdate, JoinGameResult,
    LobbyData, ObjectId, Player, PlayerId, PlayerOrdersMessage, PlayerSlot,
    ServiceMessage, ServiceRequest, SlotClaim, SlotId, SlotStatus,
    TurnPhase, PROTOCOL_VERSION,
};
use supremacy_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{ServiceConfig, ServiceError};

/// Channel sender for delivering outbound messages to one player's
/// connection handler.
pub type PlayerSender = mpsc::UnboundedSender<ServiceMessage>;

/// Commands sent to the host actor through its channel.
pub(crate) enum HostCommand {
    HostGame {
        conn_id: ConnectionId,
        init_data: GameInitData,
        protocol_version: u32,
        outbound: PlayerSender,
        reply: oneshot::Sender<(
            HostGameResult,
            Option<Player>,
            Option<LobbyData>,
        )>,
    },

    JoinGame {
        conn_id: ConnectionId,
        player_name: String,
        protocol_version: u32,
        outbound: PlayerSender,
        reply: oneshot::Sender<(
            JoinGameResult,
            Option<Player>,
            Option<LobbyData>,
        )>,
    },

    /// A post-handshake request from an authenticated player.
    Request {
        player_id: PlayerId,
        request: ServiceRequest,
    },

    /// The player's connection dropped without a `Disconnect` request.
    PlayerDropped { player_id: PlayerId },

    /// Game-layer hook: a combat encounter opened this turn.
    OpenCombat {
        combat_id: CombatId,
        participants: Vec<EmpireId>,
    },

    /// Current lobby snapshot (diagnostics and tests).
    GetLobby { reply: oneshot::Sender<LobbyData> },

    HeartbeatTick,

    Shutdown,
}

/// Handle to the running host actor. Cheap to clone.
#[derive(Clone)]
pub struct HostHandle {
    sender: mpsc::Sender<HostCommand>,
}

impl HostHandle {
    pub(crate) async fn host_game(
        &self,
        conn_id: ConnectionId,
        init_data: GameInitData,
        protocol_version: u32,
        outbound: PlayerSender,
    ) -> Result<
        (HostGameResult, Option<Player>, Option<LobbyData>),
        ServiceError,
    > {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(HostCommand::HostGame {
                conn_id,
                init_data,
                protocol_version,
                outbound,
                reply,
            })
            .await
            .map_err(|_| ServiceError::HostUnavailable)?;
        rx.await.map_err(|_| ServiceError::HostUnavailable)
    }

    pub(crate) async fn join_game(
        &self,
        conn_id: ConnectionId,
        player_name: String,
        protocol_version: u32,
        outbound: PlayerSender,
    ) -> Result<
        (JoinGameResult, Option<Player>, Option<LobbyData>),
        ServiceError,
    > {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(HostCommand::JoinGame {
                conn_id,
                player_name,
                protocol_version,
                outbound,
                reply,
            })
            .await
            .map_err(|_| ServiceError::HostUnavailable)?;
        rx.await.map_err(|_| ServiceError::HostUnavailable)
    }

    /// Forwards one post-handshake request (fire-and-forget).
    pub(crate) async fn request(
        &self,
        player_id: PlayerId,
        request: ServiceRequest,
    ) -> Result<(), ServiceError> {
        self.sender
            .send(HostCommand::Request { player_id, request })
            .await
            .map_err(|_| ServiceError::HostUnavailable)
    }

    pub(crate) async fn player_dropped(
        &self,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        self.sender
            .send(HostCommand::PlayerDropped { player_id })
            .await
            .map_err(|_| ServiceError::HostUnavailable)
    }

    /// Opens a combat encounter. Called by the embedding game layer when
    /// its turn resolution detects contact; the sync layer only gates
    /// orders on it and broadcasts updates.
    pub async fn open_combat(
        &self,
        combat_id: CombatId,
        participants: Vec<EmpireId>,
    ) -> Result<(), ServiceError> {
        self.sender
            .send(HostCommand::OpenCombat {
                combat_id,
                participants,
            })
            .await
            .map_err(|_| ServiceError::HostUnavailable)
    }

    /// Current lobby snapshot.
    pub async fn lobby(&self) -> Result<LobbyData, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(HostCommand::GetLobby { reply })
            .await
            .map_err(|_| ServiceError::HostUnavailable)?;
        rx.await.map_err(|_| ServiceError::HostUnavailable)
    }

    pub(crate) async fn heartbeat_tick(&self) -> Result<(), ServiceError> {
        self.sender
            .send(HostCommand::HeartbeatTick)
            .await
            .map_err(|_| ServiceError::HostUnavailable)
    }

    /// Tells the host actor to shut down.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.sender
            .send(HostCommand::Shutdown)
            .await
            .map_err(|_| ServiceError::HostUnavailable)
    }
}

/// One connected player as the host sees them.
struct Seat {
    player: Player,
    outbound: PlayerSender,
    #[allow(dead_code)]
    conn_id: ConnectionId,
    missed_pings: u32,
    finished_turn: bool,
}

struct CombatEncounter {
    round: u32,
    resolved: bool,
    participants: Vec<EmpireId>,
    orders: HashMap<PlayerId, CombatOrders>,
    target_primaries: HashMap<PlayerId, CombatTargetPrimaries>,
    target_secondaries: HashMap<PlayerId, CombatTargetSecondaries>,
}

/// On-disk save snapshot; also reused as the opaque per-player game
/// snapshot bytes until a real game layer plugs in.
#[derive(Serialize, Deserialize)]
struct SaveGameFile {
    turn: u32,
    options: GameOptions,
    players: Vec<Player>,
}

/// The internal host actor state. Runs inside a tokio task.
struct HostActor {
    receiver: mpsc::Receiver<HostCommand>,
    options: GameOptions,
    save_dir: PathBuf,
    max_missed_pings: u32,
    slots: Vec<PlayerSlot>,
    players: HashMap<PlayerId, Seat>,
    session_started: bool,
    game_started: bool,
    turn: u32,
    next_player_id: i32,
    next_object_id: i32,
    next_ping_id: u32,
    orders: HashMap<PlayerId, PlayerOrdersMessage>,
    combats: HashMap<CombatId, CombatEncounter>,
}

/// Spawns the host actor and its heartbeat loop; returns the handle.
pub fn spawn_host(config: &ServiceConfig) -> HostHandle {
    let (tx, rx) = mpsc::channel(64);

    let mut actor = HostActor {
        receiver: rx,
        options: config.options.clone(),
        save_dir: config.save_dir.clone(),
        max_missed_pings: config.max_missed_pings,
        slots: Vec::new(),
        players: HashMap::new(),
        session_started: false,
        game_started: false,
        turn: 0,
        next_player_id: 1, // 0 is reserved for the game host
        next_object_id: 1,
        next_ping_id: 0,
        orders: HashMap::new(),
        combats: HashMap::new(),
    };
    actor.rebuild_slots();
    tokio::spawn(actor.run());

    // Heartbeat loop with a jittered start so co-located hosts don't
    // ping in lockstep.
    let handle = HostHandle { sender: tx };
    let interval = config.heartbeat_interval;
    if !interval.is_zero() {
        let heartbeat = handle.clone();
        tokio::spawn(async move {
            let jitter_ms =
                rand::rng().random_range(0..interval.as_millis().max(1) as u64);
            tokio::time::sleep(std::time::Duration::from_millis(jitter_ms))
                .await;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if heartbeat.heartbeat_tick().await.is_err() {
                    break;
                }
            }
        });
    }

    handle
}

impl HostActor {
    async fn run(mut self) {
        tracing::info!("host actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                HostCommand::HostGame {
                    conn_id,
                    init_data,
                    protocol_version,
                    outbound,
                    reply,
                } => {
                    let result = self.handle_host_game(
                        conn_id,
                        init_data,
                        protocol_version,
                        outbound,
                    );
                    let _ = reply.send(result);
                }
                HostCommand::JoinGame {
                    conn_id,
                    player_name,
                    protocol_version,
                    outbound,
                    reply,
                } => {
                    let result = self.handle_join_game(
                        conn_id,
                        player_name,
                        protocol_version,
                        outbound,
                    );
                    let _ = reply.send(result);
                }
                HostCommand::Request { player_id, request } => {
                    self.handle_request(player_id, request);
                }
                HostCommand::PlayerDropped { player_id } => {
                    self.drop_player(player_id);
                }
                HostCommand::OpenCombat {
                    combat_id,
                    participants,
                } => {
                    self.open_combat(combat_id, participants);
                }
                HostCommand::GetLobby { reply } => {
                    let _ = reply.send(self.lobby());
                }
                HostCommand::HeartbeatTick => {
                    self.handle_heartbeat();
                }
                HostCommand::Shutdown => {
                    tracing::info!("host shutting down");
                    self.broadcast(ServiceMessage::NotifyDisconnected);
                    break;
                }
            }
        }

        tracing::info!("host actor stopped");
    }

    // -----------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------

    fn handle_host_game(
        &mut self,
        conn_id: ConnectionId,
        init_data: GameInitData,
        protocol_version: u32,
        outbound: PlayerSender,
    ) -> (HostGameResult, Option<Player>, Option<LobbyData>) {
        if self.session_started {
            tracing::warn!("second HostGame rejected");
            return (HostGameResult::ServiceAlreadyRunning, None, None);
        }
        if protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                protocol_version,
                "host with wrong protocol version"
            );
            return (HostGameResult::UnknownFailure, None, None);
        }

        if let Some(file_name) = &init_data.saved_game {
            if let Err(e) = self.load_save(file_name) {
                tracing::warn!(file_name, error = %e, "load failed");
                return (HostGameResult::LoadGameFailure, None, None);
            }
        } else {
            self.options = init_data.options;
        }
        self.rebuild_slots();
        self.session_started = true;

        let mut player =
            Player::new(PlayerId::GAME_HOST, init_data.host_name);
        if !self.seat_in_open_slot(&mut player) {
            // max_players of 0 would do this; treat as misconfiguration.
            tracing::warn!("no open slot for the hosting player");
            return (HostGameResult::UnknownFailure, None, None);
        }
        self.players.insert(
            player.player_id,
            Seat {
                player: player.clone(),
                outbound,
                conn_id,
                missed_pings: 0,
                finished_turn: false,
            },
        );

        tracing::info!(player = %player.player_id, name = %player.name, "game hosted");
        (HostGameResult::Success, Some(player), Some(self.lobby()))
    }

    fn handle_join_game(
        &mut self,
        conn_id: ConnectionId,
        player_name: String,
        protocol_version: u32,
        outbound: PlayerSender,
    ) -> (JoinGameResult, Option<Player>, Option<LobbyData>) {
        if protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                protocol_version,
                expected = PROTOCOL_VERSION,
                "join with wrong protocol version"
            );
            return (JoinGameResult::VersionMismatch, None, None);
        }
        if self.game_started {
            return (JoinGameResult::GameAlreadyStarted, None, None);
        }
        if player_name.trim().is_empty() {
            return (JoinGameResult::ConnectionFailure, None, None);
        }
        if !self.slots.iter().any(PlayerSlot::is_vacant) {
            tracing::info!(name = %player_name, "join rejected, game is full");
            return (JoinGameResult::GameIsFull, None, None);
        }

        let player_id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        let mut player = Player::new(player_id, player_name);
        // Cannot fail: a vacant slot was just verified.
        self.seat_in_open_slot(&mut player);

        self.players.insert(
            player_id,
            Seat {
                player: player.clone(),
                outbound,
                conn_id,
                missed_pings: 0,
                finished_turn: false,
            },
        );

        let lobby = self.lobby();
        // The joiner's own push lands first in their outbound queue.
        self.send_to(
            player_id,
            ServiceMessage::NotifyOnJoin {
                local_player: player.clone(),
                lobby: lobby.clone(),
            },
        );
        self.broadcast_except(
            player_id,
            ServiceMessage::NotifyPlayerJoined {
                player: player.clone(),
            },
        );
        self.broadcast_except(
            player_id,
            ServiceMessage::NotifyLobbyUpdated {
                lobby: lobby.clone(),
            },
        );

        tracing::info!(player = %player_id, name = %player.name, "player joined");
        (JoinGameResult::Success, Some(player), Some(lobby))
    }

    // -----------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------

    fn handle_request(
        &mut self,
        player_id: PlayerId,
        request: ServiceRequest,
    ) {
        if !self.players.contains_key(&player_id) {
            tracing::warn!(player = %player_id, "request from unknown player");
            return;
        }

        match request {
            ServiceRequest::SendChatMessage { text, recipient_id } => {
                self.handle_chat(player_id, text, recipient_id);
            }
            ServiceRequest::EndTurn { orders } => {
                self.handle_end_turn(player_id, orders);
            }
            ServiceRequest::SendCombatOrders { orders } => {
                let combat_id = orders.combat_id;
                self.with_open_combat(combat_id, player_id, |enc| {
                    enc.orders.insert(player_id, orders);
                });
            }
            ServiceRequest::SendCombatTarget1 { targets } => {
                let combat_id = targets.combat_id;
                self.with_open_combat(combat_id, player_id, |enc| {
                    enc.target_primaries.insert(player_id, targets);
                });
            }
            ServiceRequest::SendCombatTarget2 { targets } => {
                let combat_id = targets.combat_id;
                self.with_open_combat(combat_id, player_id, |enc| {
                    enc.target_secondaries.insert(player_id, targets);
                });
            }
            ServiceRequest::SendInvasionOrders { orders } => {
                // Invasion resolution is the game layer's job; here the
                // round advances and the invader gets the echo.
                let finished = matches!(
                    orders.action,
                    supremacy_protocol::InvasionAction::StandDown
                );
                self.send_to(
                    player_id,
                    ServiceMessage::NotifyInvasionUpdate {
                        update: InvasionUpdate {
                            invasion_id: orders.invasion_id,
                            round: 1,
                            finished,
                        },
                    },
                );
            }
            ServiceRequest::NotifyInvasionScreenReady => {
                tracing::debug!(player = %player_id, "invasion screen ready");
            }
            ServiceRequest::SaveGame { file_name } => {
                if !self.require_host(player_id, "SaveGame") {
                    return;
                }
                if let Err(e) = self.save_game(&file_name) {
                    tracing::warn!(file_name, error = %e, "save failed");
                }
            }
            ServiceRequest::UpdateGameOptions { options } => {
                if !self.require_host(player_id, "UpdateGameOptions") {
                    return;
                }
                if self.game_started {
                    tracing::debug!("options change after start, ignoring");
                    return;
                }
                self.options = options;
                self.rebuild_slots();
                self.broadcast_lobby();
            }
            ServiceRequest::ClearPlayerSlot { slot_id } => {
                if !self.require_host(player_id, "ClearPlayerSlot") {
                    return;
                }
                self.vacate_slot(slot_id, SlotStatus::Open);
                self.broadcast_lobby();
            }
            ServiceRequest::ClosePlayerSlot { slot_id } => {
                if !self.require_host(player_id, "ClosePlayerSlot") {
                    return;
                }
                self.vacate_slot(slot_id, SlotStatus::Closed);
                self.broadcast_lobby();
            }
            ServiceRequest::AssignPlayerSlot { slot_id, player_id: target } => {
                if !self.require_host(player_id, "AssignPlayerSlot") {
                    return;
                }
                self.assign_slot(slot_id, target);
                self.broadcast_lobby();
            }
            ServiceRequest::StartGame => {
                if !self.require_host(player_id, "StartGame") {
                    return;
                }
                self.start_game();
            }
            ServiceRequest::GetNewObjectId => {
                let object_id = ObjectId(self.next_object_id);
                self.next_object_id += 1;
                self.send_to(
                    player_id,
                    ServiceMessage::NewObjectId { object_id },
                );
            }
            ServiceRequest::Pong { ping_id } => {
                tracing::trace!(player = %player_id, ping_id, "pong");
                if let Some(seat) = self.players.get_mut(&player_id) {
                    seat.missed_pings = 0;
                }
            }
            ServiceRequest::Disconnect => {
                self.drop_player(player_id);
            }
            ServiceRequest::HostGame { .. }
            | ServiceRequest::JoinGame { .. } => {
                tracing::debug!(
                    player = %player_id,
                    "handshake request after handshake, ignoring"
                );
            }
        }
    }

    fn handle_chat(
        &mut self,
        sender_id: PlayerId,
        text: String,
        recipient_id: Option<PlayerId>,
    ) {
        let msg = ServiceMessage::NotifyChatMessageReceived {
            sender_id,
            text,
            recipient_id,
        };
        match recipient_id {
            None => self.broadcast(msg),
            Some(recipient) => {
                self.send_to(recipient, msg.clone());
                if recipient != sender_id {
                    self.send_to(sender_id, msg);
                }
            }
        }
    }

    fn handle_end_turn(
        &mut self,
        player_id: PlayerId,
        orders: PlayerOrdersMessage,
    ) {
        if !self.game_started {
            tracing::debug!(player = %player_id, "orders before game start");
            return;
        }
        if orders.turn != self.turn {
            tracing::debug!(
                player = %player_id,
                got = orders.turn,
                current = self.turn,
                "order batch for a different turn, ignoring"
            );
            return;
        }

        // Last batch wins; the client pushes on every change.
        let newly_finished = {
            let seat = self.players.get_mut(&player_id);
            let Some(seat) = seat else { return };
            let first = !seat.finished_turn;
            seat.finished_turn = true;
            first
        };
        self.orders.insert(player_id, orders);

        if newly_finished {
            let empire_id = self.players[&player_id].player.empire_id;
            self.broadcast(ServiceMessage::NotifyPlayerFinishedTurn {
                empire_id,
            });
        }

        if self.players.values().all(|s| s.finished_turn) {
            self.process_turn();
        }
    }

    // -----------------------------------------------------------------
    // Turn processing
    // -----------------------------------------------------------------

    fn start_game(&mut self) {
        if self.game_started {
            tracing::debug!("start requested twice, ignoring");
            return;
        }
        if self.players.is_empty() {
            tracing::warn!("cannot start with an empty lobby");
            return;
        }
        self.broadcast(ServiceMessage::NotifyGameStarting);
        self.game_started = true;
        self.turn = 1;

        let snapshot = self.snapshot_bytes();
        let start_msgs: Vec<(PlayerId, ServiceMessage)> = self
            .players
            .keys()
            .map(|id| {
                (
                    *id,
                    ServiceMessage::NotifyGameStarted {
                        start: GameStartData {
                            turn: self.turn,
                            snapshot: snapshot.clone(),
                        },
                    },
                )
            })
            .collect();
        for (id, msg) in start_msgs {
            self.send_to(id, msg);
        }
        self.broadcast(ServiceMessage::NotifyTurnProgressChanged {
            phase: TurnPhase::WaitOnPlayers,
        });
        tracing::info!(players = self.players.len(), "game started");
    }

    fn process_turn(&mut self) {
        tracing::info!(turn = self.turn, "all orders in, processing turn");

        for phase in [
            TurnPhase::PreTurnOperations,
            TurnPhase::FleetMovement,
            TurnPhase::Combat,
            TurnPhase::Production,
            TurnPhase::Research,
            TurnPhase::Diplomacy,
            TurnPhase::SendUpdates,
        ] {
            self.broadcast(ServiceMessage::NotifyTurnProgressChanged {
                phase,
            });
            if phase == TurnPhase::Combat {
                self.resolve_combats();
            }
        }

        self.broadcast(ServiceMessage::NotifyAllTurnEnded);
        self.turn += 1;

        let snapshot = self.snapshot_bytes();
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in ids {
            self.send_to(
                id,
                ServiceMessage::NotifyGameDataUpdated {
                    update: GameUpdateData {
                        turn: self.turn,
                        snapshot: snapshot.clone(),
                    },
                },
            );
        }
        self.broadcast(ServiceMessage::NotifyTurnFinished);
        self.broadcast(ServiceMessage::NotifyTurnProgressChanged {
            phase: TurnPhase::WaitOnPlayers,
        });

        self.orders.clear();
        for seat in self.players.values_mut() {
            seat.finished_turn = false;
        }
    }

    // -----------------------------------------------------------------
    // Combat bookkeeping
    // -----------------------------------------------------------------

    fn open_combat(
        &mut self,
        combat_id: CombatId,
        participants: Vec<EmpireId>,
    ) {
        let update = CombatUpdate {
            combat_id,
            round: 1,
            resolved: false,
            participants: participants.clone(),
        };
        self.combats.insert(
            combat_id,
            CombatEncounter {
                round: 1,
                resolved: false,
                participants,
                orders: HashMap::new(),
                target_primaries: HashMap::new(),
                target_secondaries: HashMap::new(),
            },
        );
        tracing::info!(%combat_id, "combat encounter opened");
        self.broadcast_to_participants(
            combat_id,
            ServiceMessage::NotifyCombatUpdate { update },
        );
    }

    /// Runs `apply` on the encounter iff it is still open; resolved or
    /// unknown encounters reject the submission with a log entry.
    fn with_open_combat<F>(
        &mut self,
        combat_id: CombatId,
        player_id: PlayerId,
        apply: F,
    ) where
        F: FnOnce(&mut CombatEncounter),
    {
        match self.combats.get_mut(&combat_id) {
            Some(enc) if !enc.resolved => apply(enc),
            Some(_) => tracing::debug!(
                %combat_id, player = %player_id,
                "orders for a resolved encounter, ignoring"
            ),
            None => tracing::debug!(
                %combat_id, player = %player_id,
                "orders for an unknown encounter, ignoring"
            ),
        }
    }

    fn resolve_combats(&mut self) {
        let open: Vec<CombatId> = self
            .combats
            .iter()
            .filter(|(_, enc)| !enc.resolved)
            .map(|(id, _)| *id)
            .collect();
        for combat_id in open {
            let update = {
                let enc = self.combats.get_mut(&combat_id).unwrap();
                enc.resolved = true;
                CombatUpdate {
                    combat_id,
                    round: enc.round,
                    resolved: true,
                    participants: enc.participants.clone(),
                }
            };
            tracing::info!(%combat_id, "combat encounter resolved");
            self.broadcast_to_participants(
                combat_id,
                ServiceMessage::NotifyCombatUpdate { update },
            );
        }
    }

    fn broadcast_to_participants(
        &self,
        combat_id: CombatId,
        msg: ServiceMessage,
    ) {
        let Some(enc) = self.combats.get(&combat_id) else { return };
        for seat in self.players.values() {
            if enc.participants.contains(&seat.player.empire_id) {
                let _ = seat.outbound.send(msg.clone());
            }
        }
    }

    // -----------------------------------------------------------------
    // Roster and slots
    // -----------------------------------------------------------------

    /// Rebuilds the slot table for the current options, reseating every
    /// connected player in join order.
    fn rebuild_slots(&mut self) {
        self.slots = (0..self.options.max_players)
            .map(|i| PlayerSlot::open(SlotId(i), EmpireId(i as i32)))
            .collect();
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        for id in ids {
            let mut player = self.players[&id].player.clone();
            if self.seat_in_open_slot(&mut player) {
                self.players.get_mut(&id).unwrap().player = player;
            } else {
                tracing::warn!(player = %id, "no slot after options change");
            }
        }
    }

    /// Seats the player in the first vacant slot, stamping their empire
    /// from the slot. Returns `false` if the lobby has no vacancy.
    fn seat_in_open_slot(&mut self, player: &mut Player) -> bool {
        let Some(slot) =
            self.slots.iter_mut().find(|s| s.is_vacant())
        else {
            return false;
        };
        slot.status = SlotStatus::Taken;
        slot.claim = SlotClaim::Assigned;
        slot.player_id = Some(player.player_id);
        player.empire_id = slot.empire_id;
        true
    }

    fn vacate_slot(&mut self, slot_id: SlotId, new_status: SlotStatus) {
        let Some(slot) =
            self.slots.iter_mut().find(|s| s.slot_id == slot_id)
        else {
            tracing::debug!(%slot_id, "unknown slot");
            return;
        };
        let evicted = slot.player_id.take();
        slot.status = new_status;
        slot.claim = SlotClaim::Unassigned;
        if let Some(player_id) = evicted {
            if let Some(seat) = self.players.get_mut(&player_id) {
                seat.player.empire_id = EmpireId::INVALID;
            }
            tracing::info!(%slot_id, player = %player_id, "slot vacated");
        }
    }

    fn assign_slot(&mut self, slot_id: SlotId, player_id: PlayerId) {
        if !self.players.contains_key(&player_id) {
            tracing::debug!(player = %player_id, "cannot seat unknown player");
            return;
        }
        // Free the player's current slot first (one slot per player).
        if let Some(current) = self
            .slots
            .iter()
            .find(|s| s.player_id == Some(player_id))
            .map(|s| s.slot_id)
        {
            if current == slot_id {
                return;
            }
            self.vacate_slot(current, SlotStatus::Open);
        }

        let Some(slot) =
            self.slots.iter_mut().find(|s| s.slot_id == slot_id)
        else {
            tracing::debug!(%slot_id, "unknown slot");
            return;
        };
        if !slot.is_vacant() {
            tracing::debug!(%slot_id, "slot not open, ignoring assignment");
            return;
        }
        slot.status = SlotStatus::Taken;
        slot.claim = SlotClaim::Assigned;
        slot.player_id = Some(player_id);
        let empire_id = slot.empire_id;
        if let Some(seat) = self.players.get_mut(&player_id) {
            seat.player.empire_id = empire_id;
        }
        tracing::info!(%slot_id, player = %player_id, "slot assigned");
    }

    fn drop_player(&mut self, player_id: PlayerId) {
        let Some(seat) = self.players.remove(&player_id) else {
            return;
        };
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.player_id == Some(player_id))
        {
            slot.status = SlotStatus::Open;
            slot.claim = SlotClaim::Unassigned;
            slot.player_id = None;
        }
        self.orders.remove(&player_id);

        tracing::info!(player = %player_id, name = %seat.player.name, "player exited");
        self.broadcast(ServiceMessage::NotifyPlayerExited {
            player: seat.player,
        });
        self.broadcast_lobby();

        // The departed player must not stall the turn.
        if self.game_started
            && !self.players.is_empty()
            && self.players.values().all(|s| s.finished_turn)
        {
            self.process_turn();
        }
    }

    fn require_host(&self, player_id: PlayerId, op: &str) -> bool {
        if player_id.is_game_host() {
            return true;
        }
        tracing::warn!(player = %player_id, op, "host-only request ignored");
        false
    }

    // -----------------------------------------------------------------
    // Heartbeat
    // -----------------------------------------------------------------

    fn handle_heartbeat(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.next_ping_id += 1;
        let ping = ServiceMessage::Ping {
            ping_id: self.next_ping_id,
        };

        let mut dead = Vec::new();
        for (id, seat) in &mut self.players {
            seat.missed_pings += 1;
            if seat.missed_pings > self.max_missed_pings {
                dead.push(*id);
                continue;
            }
            let _ = seat.outbound.send(ping.clone());
        }
        for player_id in dead {
            tracing::warn!(player = %player_id, "heartbeat timeout, dropping");
            self.send_to(player_id, ServiceMessage::NotifyDisconnected);
            self.drop_player(player_id);
        }
    }

    // -----------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------

    fn snapshot_bytes(&self) -> Vec<u8> {
        let header = SaveGameFile {
            turn: self.turn,
            options: self.options.clone(),
            players: self
                .players
                .values()
                .map(|s| s.player.clone())
                .collect(),
        };
        serde_json::to_vec(&header).unwrap_or_default()
    }

    fn save_game(&self, file_name: &str) -> Result<(), ServiceError> {
        let file_name = sanitize_file_name(file_name)?;
        std::fs::create_dir_all(&self.save_dir)
            .map_err(ServiceError::Save)?;
        let path = self.save_dir.join(file_name);
        std::fs::write(&path, self.snapshot_bytes())
            .map_err(ServiceError::Save)?;
        tracing::info!(path = %path.display(), turn = self.turn, "game saved");
        Ok(())
    }

    fn load_save(&mut self, file_name: &str) -> Result<(), ServiceError> {
        let file_name = sanitize_file_name(file_name)?;
        let path = self.save_dir.join(file_name);
        let bytes = std::fs::read(&path).map_err(ServiceError::Save)?;
        let save: SaveGameFile = serde_json::from_slice(&bytes)
            .map_err(supremacy_protocol::ProtocolError::Decode)?;
        self.turn = save.turn;
        self.options = save.options;
        tracing::info!(path = %path.display(), turn = self.turn, "game loaded");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------

    fn lobby(&self) -> LobbyData {
        let mut players: Vec<Player> = self
            .players
            .values()
            .map(|s| s.player.clone())
            .collect();
        players.sort_by_key(|p| p.player_id.0);
        LobbyData {
            players,
            slots: self.slots.clone(),
            options: self.options.clone(),
            game_started: self.game_started,
        }
    }

    fn broadcast_lobby(&self) {
        self.broadcast(ServiceMessage::NotifyLobbyUpdated {
            lobby: self.lobby(),
        });
    }

    /// Sends to every connected player. Dead queues are dropped silently;
    /// the connection handler notices its own demise.
    fn broadcast(&self, msg: ServiceMessage) {
        for seat in self.players.values() {
            let _ = seat.outbound.send(msg.clone());
        }
    }

    fn broadcast_except(&self, excluded: PlayerId, msg: ServiceMessage) {
        for (id, seat) in &self.players {
            if *id != excluded {
                let _ = seat.outbound.send(msg.clone());
            }
        }
    }

    fn send_to(&self, player_id: PlayerId, msg: ServiceMessage) {
        if let Some(seat) = self.players.get(&player_id) {
            let _ = seat.outbound.send(msg);
        }
    }
}

/// Rejects path traversal in save file names.
fn sanitize_file_name(file_name: &str) -> Result<&str, ServiceError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty()
        || trimmed.contains(['/', '\\'])
        || trimmed.contains("..")
        || Path::new(trimmed).is_absolute()
    {
        return Err(ServiceError::Save(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid save name: {file_name:?}"),
        )));
    }
    Ok(trimmed)
}
