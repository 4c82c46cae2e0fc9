//! Game client session.
//!
//! [`GameClient`] wraps exactly one duplex channel at a time and mediates
//! all traffic between the local game layer and the host:
//!
//! ```text
//! UI intents → ClientEventBus (commands) → pump task → channel → host
//! host pushes → reader task → CallbackSink → ClientEventBus (events)
//! ```
//!
//! Concurrency model: a single coarse lock guards the session's mutable
//! state (connected flag, channel handle, latched disconnect reason); an
//! independent lock guards pump hook state so registering bus
//! subscriptions never nests inside the session lock. Outbound calls run
//! on the caller's task; the only synchronous remote call is
//! [`GameClient::new_object_id`], which parks the caller on a oneshot
//! rather than blocking the callback loop.
//!
//! Post-handshake remote failures are caught, logged, and swallowed: the
//! operation simply did not happen this time. Handshake failures and
//! channel faults latch a [`ClientDisconnectReason`] (first one wins) and
//! tear the session down exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use supremacy_protocol::{
    ClientDisconnectReason, Codec, Envelope, GameInitData, HostGameResult,
    JoinGameResult, JsonCodec, LobbyData, ObjectId, Payload, Player,
    PlayerOrdersMessage, ProtocolError, ServiceMessage, ServiceRequest,
    PROTOCOL_VERSION,
};
use supremacy_transport::{
    connect as dial, Connection, DuplexChannel, ServiceAddress,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::callback::CallbackSink;
use crate::{
    ClientCommand, ClientError, ClientEvent, ClientEventBus,
    PlayerOrderService,
};

/// How long a correlated call (handshake, object-id) may stay unanswered.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Diagnostic lifecycle state of the session's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Faulted,
    Closed,
    Disconnecting,
}

/// The game client session. See the module docs for the data flow.
pub struct GameClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    bus: ClientEventBus,
    orders: Arc<dyn PlayerOrderService>,
    sink: CallbackSink,
    codec: JsonCodec,
    state: Mutex<SessionState>,
    hooks: Mutex<HookState>,
    /// Waiters for correlated responses, matched strictly in FIFO order.
    pending: Mutex<VecDeque<oneshot::Sender<ServiceMessage>>>,
    /// Keeps "enqueue waiter" and "send request" atomic across callers so
    /// the FIFO matching above stays sound.
    request_gate: tokio::sync::Mutex<()>,
    disposed: AtomicBool,
    disconnect_fired: AtomicBool,
    turn: AtomicU32,
    seq: AtomicU64,
    started_at: Instant,
}

#[derive(Default)]
struct SessionState {
    channel_state: ChannelState,
    is_connected: bool,
    /// True only after a successful handshake; gates fault handling so a
    /// pre-handshake channel drop does not fire disconnect notifications.
    established: bool,
    is_game_host: bool,
    disconnect_reason: Option<ClientDisconnectReason>,
    channel: Option<Arc<DuplexChannel>>,
    local_player: Option<Player>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::Disconnected
    }
}

#[derive(Default)]
struct HookState {
    hooked: bool,
    pump: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl GameClient {
    /// Creates a session wired to the given bus and order service.
    ///
    /// Must be called inside a tokio runtime (the callback sink spawns
    /// its event loop immediately).
    pub fn new(
        bus: ClientEventBus,
        orders: Arc<dyn PlayerOrderService>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| {
            let sink = CallbackSink::new(bus.clone());
            sink.bind_session(weak.clone());
            ClientInner {
                bus,
                orders,
                sink,
                codec: JsonCodec,
                state: Mutex::new(SessionState::default()),
                hooks: Mutex::new(HookState::default()),
                pending: Mutex::new(VecDeque::new()),
                request_gate: tokio::sync::Mutex::new(()),
                disposed: AtomicBool::new(false),
                disconnect_fired: AtomicBool::new(false),
                turn: AtomicU32::new(0),
                seq: AtomicU64::new(1),
                started_at: Instant::now(),
            }
        });
        Self { inner }
    }

    /// Joins a game hosted at `address`.
    ///
    /// On success the lobby snapshot is published through the callback
    /// scheduler (never inline). On a refused handshake the session latches
    /// the mapped reason, tears down, and returns it as an error.
    pub async fn connect(
        &self,
        player_name: &str,
        address: &ServiceAddress,
    ) -> Result<(), ClientError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "player name must not be empty".into(),
            ));
        }
        let handshake = ServiceRequest::JoinGame {
            player_name: player_name.to_string(),
            protocol_version: PROTOCOL_VERSION,
        };
        self.inner.establish(handshake, address).await
    }

    /// Hosts a game at `address` and connects to it as the host player.
    pub async fn host_and_connect(
        &self,
        init_data: GameInitData,
        address: &ServiceAddress,
    ) -> Result<(), ClientError> {
        if init_data.host_name.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "host name must not be empty".into(),
            ));
        }
        let handshake = ServiceRequest::HostGame {
            init_data,
            protocol_version: PROTOCOL_VERSION,
        };
        self.inner.establish(handshake, address).await
    }

    /// Ends the session. Idempotent; at most one `Disconnected` event is
    /// published per session.
    pub async fn disconnect(&self) {
        self.inner
            .disconnect_with(ClientDisconnectReason::Disconnected)
            .await;
    }

    /// Disposes the session: disconnects, stops the callback sink, and
    /// rejects all further use. Idempotent.
    pub async fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner
            .disconnect_with(ClientDisconnectReason::Disconnected)
            .await;
        self.inner.sink.dispose();
    }

    /// Allocates a globally-unique object id from the host.
    ///
    /// The one synchronous remote call: the caller parks on a oneshot
    /// until the host answers. Runs on the caller's task, never on the
    /// callback loop, so concurrent callers cannot deadlock it.
    pub async fn new_object_id(&self) -> Result<ObjectId, ClientError> {
        self.inner.new_object_id().await
    }

    /// Publishes the local "turn ended" signal; the session reacts by
    /// flushing the current order batch to the host.
    pub fn end_turn(&self) {
        self.inner.bus.publish_event(ClientEvent::TurnEnded);
    }

    /// Sends a chat line. `None` recipient broadcasts. Fire-and-forget.
    pub async fn send_chat_message(
        &self,
        text: impl Into<String>,
        recipient_id: Option<supremacy_protocol::PlayerId>,
    ) {
        self.inner
            .execute_remote(ServiceRequest::SendChatMessage {
                text: text.into(),
                recipient_id,
            })
            .await;
    }

    /// Asks the host to start the game. Fire-and-forget; the host ignores
    /// the request unless it comes from the host player.
    pub async fn start_game(&self) {
        self.inner.execute_remote(ServiceRequest::StartGame).await;
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().unwrap().is_connected
    }

    pub fn channel_state(&self) -> ChannelState {
        self.inner.state.lock().unwrap().channel_state
    }

    pub fn local_player(&self) -> Option<Player> {
        self.inner.state.lock().unwrap().local_player.clone()
    }

    pub fn disconnect_reason(&self) -> Option<ClientDisconnectReason> {
        self.inner.state.lock().unwrap().disconnect_reason
    }

    /// The turn the session believes is in play (0 before game start).
    pub fn current_turn(&self) -> u32 {
        self.inner.turn.load(Ordering::SeqCst)
    }

    pub fn bus(&self) -> &ClientEventBus {
        &self.inner.bus
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Drop is synchronous; finish teardown on a detached task. The
        // sink is disposed after the terminal event has been posted.
        let inner = Arc::clone(&self.inner);
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(async move {
                inner
                    .disconnect_with(ClientDisconnectReason::Disconnected)
                    .await;
                inner.sink.dispose();
            });
        }
    }
}

impl ClientInner {
    // -----------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------

    async fn establish(
        self: &Arc<Self>,
        handshake: ServiceRequest,
        address: &ServiceAddress,
    ) -> Result<(), ClientError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ClientError::Disposed);
        }
        {
            let mut st = self.state.lock().unwrap();
            if st.is_connected {
                return Err(ClientError::AlreadyConnected);
            }
            st.channel_state = ChannelState::Connecting;
            st.disconnect_reason = None;
            st.local_player = None;
            st.is_game_host = false;
        }
        // Fresh session: previous terminal state no longer applies.
        self.disconnect_fired.store(false, Ordering::SeqCst);
        self.pending.lock().unwrap().clear();
        self.turn.store(0, Ordering::SeqCst);

        tracing::info!(%address, "connecting");
        let channel = match dial(address).await {
            Ok(channel) => Arc::new(channel),
            Err(e) => {
                self.state.lock().unwrap().channel_state =
                    ChannelState::Disconnected;
                tracing::warn!(error = %e, "connect failed");
                return Err(e.into());
            }
        };

        {
            let mut st = self.state.lock().unwrap();
            st.channel = Some(Arc::clone(&channel));
            st.channel_state = ChannelState::Connected;
            st.is_connected = true;
        }

        let reader = tokio::spawn(run_reader(
            Arc::clone(self),
            Arc::clone(&channel),
        ));
        self.hooks.lock().unwrap().reader = Some(reader);
        self.hook();
        self.sink.post_event(ClientEvent::Connected);

        let hosting =
            matches!(handshake, ServiceRequest::HostGame { .. });
        match self.call(&channel, handshake).await {
            Ok(ServiceMessage::JoinGameResponse {
                result,
                local_player,
                lobby,
            }) if !hosting => match result {
                JoinGameResult::Success => {
                    self.complete_handshake(local_player, lobby, false)
                }
                refused => {
                    let reason = map_join_result(refused);
                    tracing::warn!(?refused, "join refused");
                    self.disconnect_with(reason).await;
                    Err(ClientError::ConnectionRefused(reason))
                }
            },
            Ok(ServiceMessage::HostGameResponse {
                result,
                local_player,
                lobby,
            }) if hosting => match result {
                HostGameResult::Success => {
                    self.complete_handshake(local_player, lobby, true)
                }
                refused => {
                    let reason = map_host_result(refused);
                    tracing::warn!(?refused, "host attempt refused");
                    self.disconnect_with(reason).await;
                    Err(ClientError::ConnectionRefused(reason))
                }
            },
            Ok(other) => {
                tracing::warn!(?other, "unexpected handshake response");
                self.disconnect_with(ClientDisconnectReason::UnknownFailure)
                    .await;
                Err(ProtocolError::InvalidMessage(
                    "unexpected handshake response".into(),
                )
                .into())
            }
            Err(e) => {
                // A reader-latched reason (e.g. ConnectionClosed) wins
                // over the generic fallback.
                self.disconnect_with(ClientDisconnectReason::UnknownFailure)
                    .await;
                Err(e)
            }
        }
    }

    fn complete_handshake(
        &self,
        local_player: Option<Player>,
        lobby: Option<LobbyData>,
        hosting: bool,
    ) -> Result<(), ClientError> {
        {
            let mut st = self.state.lock().unwrap();
            st.established = true;
            st.is_game_host = hosting;
            st.local_player = local_player;
        }
        // The snapshot goes through the scheduler, never inline, so it
        // cannot interleave with notifications already in flight.
        if let Some(lobby) = lobby {
            self.sink.post_event(ClientEvent::LobbyUpdated(lobby));
        }
        tracing::info!(hosting, "session established");
        Ok(())
    }

    /// Ends the session. First latched reason wins; the terminal event
    /// fires at most once per session.
    pub(crate) async fn disconnect_with(
        &self,
        reason: ClientDisconnectReason,
    ) {
        let channel = {
            let mut st = self.state.lock().unwrap();
            if st.channel.is_none() && !st.is_connected {
                return;
            }
            st.disconnect_reason.get_or_insert(reason);
            st.is_connected = false;
            st.established = false;
            st.channel_state = ChannelState::Disconnecting;
            st.channel.take()
        };

        self.unhook();

        if let Some(channel) = channel {
            // Best-effort goodbye; the channel may already be dead.
            if let Err(e) =
                self.send_on(&channel, ServiceRequest::Disconnect).await
            {
                tracing::debug!(error = %e, "disconnect notice failed");
            }
            if let Err(e) = channel.close().await {
                tracing::debug!(error = %e, "channel close failed");
            }
        }

        // Dropping the waiters unblocks every parked caller.
        self.pending.lock().unwrap().clear();

        if !self.disconnect_fired.swap(true, Ordering::SeqCst) {
            let reason = self
                .state
                .lock()
                .unwrap()
                .disconnect_reason
                .unwrap_or(ClientDisconnectReason::ConnectionBroken);
            tracing::info!(?reason, "session disconnected");
            self.sink.post_event(ClientEvent::Disconnected(reason));
        }

        self.state.lock().unwrap().channel_state =
            ChannelState::Disconnected;
    }

    /// Reader-side fault handling. Latches the reason and, if a session
    /// was established, schedules teardown on a detached task (the reader
    /// itself gets aborted during unhook and must not tear down inline).
    fn on_channel_down(
        self: &Arc<Self>,
        channel_state: ChannelState,
        reason: ClientDisconnectReason,
    ) {
        let established = {
            let mut st = self.state.lock().unwrap();
            if st.channel.is_none() {
                return; // already torn down locally
            }
            st.channel_state = channel_state;
            // Before the handshake completes the connect path owns the
            // failure reason (a refused handshake is followed by a close;
            // the refusal must win the latch).
            if st.established {
                st.disconnect_reason.get_or_insert(reason);
            }
            st.established
        };
        // Unblock handshake/object-id waiters immediately.
        self.pending.lock().unwrap().clear();
        if established {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.disconnect_with(reason).await;
            });
        }
    }

    // -----------------------------------------------------------------
    // Command pump hook/unhook
    // -----------------------------------------------------------------

    /// Subscribes the command/event pump exactly once per connection
    /// lifecycle. Guarded by its own lock, never nested in the session
    /// lock.
    fn hook(self: &Arc<Self>) {
        let mut hooks = self.hooks.lock().unwrap();
        if hooks.hooked {
            tracing::debug!("command pump already hooked");
            return;
        }
        let commands = self.bus.subscribe_commands();
        let events = self.bus.subscribe_events();
        let changes = self.orders.subscribe_changes();
        hooks.pump = Some(tokio::spawn(run_pump(
            Arc::clone(self),
            commands,
            events,
            changes,
        )));
        hooks.hooked = true;
    }

    fn unhook(&self) {
        let mut hooks = self.hooks.lock().unwrap();
        if let Some(pump) = hooks.pump.take() {
            pump.abort();
        }
        if let Some(reader) = hooks.reader.take() {
            reader.abort();
        }
        hooks.hooked = false;
    }

    // -----------------------------------------------------------------
    // Outbound calls
    // -----------------------------------------------------------------

    /// Fire-and-forget remote call: connected-check, send, swallow
    /// failures. The UI never crashes on a transient RPC fault.
    pub(crate) async fn execute_remote(&self, request: ServiceRequest) {
        let channel = {
            let st = self.state.lock().unwrap();
            if !st.is_connected {
                tracing::debug!(
                    ?request,
                    "not connected, dropping remote call"
                );
                return;
            }
            st.channel.clone()
        };
        let Some(channel) = channel else { return };
        if let Err(e) = self.send_on(&channel, request).await {
            tracing::warn!(error = %e, "remote call failed, skipping");
        }
    }

    async fn new_object_id(&self) -> Result<ObjectId, ClientError> {
        let channel = {
            let st = self.state.lock().unwrap();
            if !st.is_connected {
                return Err(ClientError::NotConnected);
            }
            st.channel.clone().ok_or(ClientError::NotConnected)?
        };
        match self.call(&channel, ServiceRequest::GetNewObjectId).await? {
            ServiceMessage::NewObjectId { object_id } => Ok(object_id),
            other => Err(ProtocolError::InvalidMessage(format!(
                "expected NewObjectId, got {other:?}"
            ))
            .into()),
        }
    }

    /// Correlated request/response: enqueue a waiter, send, await the
    /// reply matched in FIFO order by the reader.
    async fn call(
        &self,
        channel: &DuplexChannel,
        request: ServiceRequest,
    ) -> Result<ServiceMessage, ClientError> {
        let rx = {
            let _gate = self.request_gate.lock().await;
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(tx);
            if let Err(e) = self.send_on(channel, request).await {
                self.pending.lock().unwrap().pop_back();
                return Err(e);
            }
            rx
        };
        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(msg)) => Ok(msg),
            Ok(Err(_)) => Err(ClientError::ConnectionLost),
            Err(_) => Err(ClientError::CallTimeout),
        }
    }

    async fn send_on(
        &self,
        channel: &DuplexChannel,
        request: ServiceRequest,
    ) -> Result<(), ClientError> {
        let envelope = Envelope {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            timestamp: self.started_at.elapsed().as_millis() as u64,
            payload: Payload::Request(request),
        };
        let bytes = self.codec.encode(&envelope)?;
        channel.send(&bytes).await?;
        Ok(())
    }

    /// Pushes the full current order batch for the current turn.
    async fn flush_orders(&self) {
        let message = PlayerOrdersMessage {
            turn: self.turn.load(Ordering::SeqCst),
            orders: self.orders.orders(),
            auto_turn: self.orders.auto_turn(),
        };
        tracing::debug!(
            turn = message.turn,
            count = message.orders.len(),
            "flushing order batch"
        );
        self.execute_remote(ServiceRequest::EndTurn { orders: message })
            .await;
    }

    async fn forward_command(&self, command: ClientCommand) {
        let request = match command {
            ClientCommand::SendChatMessage { text, recipient_id } => {
                ServiceRequest::SendChatMessage { text, recipient_id }
            }
            ClientCommand::SendCombatOrders(orders) => {
                ServiceRequest::SendCombatOrders { orders }
            }
            ClientCommand::SendCombatTarget1(targets) => {
                ServiceRequest::SendCombatTarget1 { targets }
            }
            ClientCommand::SendCombatTarget2(targets) => {
                ServiceRequest::SendCombatTarget2 { targets }
            }
            ClientCommand::SendInvasionOrders(orders) => {
                ServiceRequest::SendInvasionOrders { orders }
            }
            ClientCommand::EndInvasion => {
                ServiceRequest::NotifyInvasionScreenReady
            }
            ClientCommand::SaveGame(file_name) => {
                if !self.state.lock().unwrap().is_game_host {
                    tracing::debug!("save requested by non-host, ignoring");
                    return;
                }
                ServiceRequest::SaveGame { file_name }
            }
            ClientCommand::AssignPlayerSlot { slot_id, player_id } => {
                ServiceRequest::AssignPlayerSlot { slot_id, player_id }
            }
            ClientCommand::ClearPlayerSlot(slot_id) => {
                ServiceRequest::ClearPlayerSlot { slot_id }
            }
            ClientCommand::ClosePlayerSlot(slot_id) => {
                ServiceRequest::ClosePlayerSlot { slot_id }
            }
            ClientCommand::StartGame => ServiceRequest::StartGame,
            ClientCommand::UpdateGameOptions(options) => {
                ServiceRequest::UpdateGameOptions { options }
            }
        };
        self.execute_remote(request).await;
    }

    /// Routes one inbound message: responses to the FIFO waiters,
    /// notifications to the callback sink.
    fn route_message(&self, msg: ServiceMessage) {
        if msg.is_response() {
            let waiter = self.pending.lock().unwrap().pop_front();
            match waiter {
                Some(tx) => {
                    let _ = tx.send(msg);
                }
                None => tracing::debug!(
                    "response with no outstanding call, dropping"
                ),
            }
            return;
        }
        match &msg {
            ServiceMessage::NotifyGameStarted { start } => {
                self.turn.store(start.turn, Ordering::SeqCst)
            }
            ServiceMessage::NotifyGameDataUpdated { update } => {
                self.turn.store(update.turn, Ordering::SeqCst)
            }
            _ => {}
        }
        self.sink.deliver(msg);
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Reads envelopes off the channel until it closes or faults.
async fn run_reader(
    inner: Arc<ClientInner>,
    channel: Arc<DuplexChannel>,
) {
    loop {
        match channel.recv().await {
            Ok(Some(data)) => {
                match inner.codec.decode::<Envelope>(&data) {
                    Ok(envelope) => match envelope.payload {
                        Payload::Message(msg) => inner.route_message(msg),
                        Payload::Request(_) => tracing::debug!(
                            "request received from host, ignoring"
                        ),
                    },
                    Err(e) => tracing::debug!(
                        error = %e,
                        "failed to decode envelope"
                    ),
                }
            }
            Ok(None) => {
                tracing::info!("channel closed by host");
                inner.on_channel_down(
                    ChannelState::Closed,
                    ClientDisconnectReason::ConnectionClosed,
                );
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "channel fault");
                inner.on_channel_down(
                    ChannelState::Faulted,
                    ClientDisconnectReason::ConnectionBroken,
                );
                break;
            }
        }
    }
}

/// Forwards bus commands to the host and reacts to turn lifecycle events.
///
/// Order forwarding is armed by the local `TurnEnded` event: the current
/// batch is flushed immediately and every subsequent order mutation
/// pushes the full batch again (the host treats the last batch received
/// as authoritative). `AllTurnEnded` disarms forwarding and clears local
/// orders so nothing stale leaks into the next turn.
async fn run_pump(
    inner: Arc<ClientInner>,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    mut changes: mpsc::UnboundedReceiver<()>,
) {
    let mut forwarding = false;
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                inner.forward_command(command).await;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    ClientEvent::TurnEnded => {
                        // Change notices accumulated while idle are stale.
                        while changes.try_recv().is_ok() {}
                        forwarding = true;
                        inner.flush_orders().await;
                    }
                    ClientEvent::AllTurnEnded => {
                        forwarding = false;
                        inner.orders.clear_orders();
                    }
                    ClientEvent::ServerHeartbeat { ping_id } => {
                        inner
                            .execute_remote(ServiceRequest::Pong { ping_id })
                            .await;
                    }
                    ClientEvent::Disconnected(_) => break,
                    _ => {}
                }
            }
            change = changes.recv(), if forwarding => {
                if change.is_none() {
                    break;
                }
                inner.flush_orders().await;
            }
        }
    }
    tracing::debug!("client command pump stopped");
}

// ---------------------------------------------------------------------------
// Result mapping
// ---------------------------------------------------------------------------

fn map_join_result(result: JoinGameResult) -> ClientDisconnectReason {
    match result {
        JoinGameResult::Success => ClientDisconnectReason::Disconnected,
        JoinGameResult::GameIsFull => ClientDisconnectReason::GameIsFull,
        JoinGameResult::GameAlreadyStarted => {
            ClientDisconnectReason::GameAlreadyStarted
        }
        JoinGameResult::VersionMismatch => {
            ClientDisconnectReason::VersionMismatch
        }
        JoinGameResult::ConnectionFailure => {
            ClientDisconnectReason::UnknownFailure
        }
    }
}

fn map_host_result(result: HostGameResult) -> ClientDisconnectReason {
    match result {
        HostGameResult::Success => ClientDisconnectReason::Disconnected,
        HostGameResult::LoadGameFailure => {
            ClientDisconnectReason::LoadGameFailure
        }
        HostGameResult::ChannelFaultFailure => {
            ClientDisconnectReason::LocalServiceFailure
        }
        HostGameResult::ServiceAlreadyRunning
        | HostGameResult::UnknownFailure => {
            ClientDisconnectReason::UnknownFailure
        }
    }
}
