//! Callback sink: the client's single-consumer notification scheduler.
//!
//! Every host-pushed notification is mapped to a [`ClientEvent`] and the
//! publication is enqueued as a job on one FIFO queue drained by exactly
//! one consumer task. That task is the client's event loop: downstream
//! handlers observe notifications in the order the host sent them and
//! never concurrently with each other, which is the core correctness
//! invariant of the client — applying host notifications out of order or
//! in parallel would corrupt the local game state mirror.
//!
//! The sink holds a weak back-reference to the owning session so a
//! host-initiated `NotifyDisconnected` can tear the session down without
//! creating a reference cycle. Disposing the sink clears that
//! back-reference and stops accepting jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Weak};

use supremacy_protocol::{ChatMessage, ClientDisconnectReason, ServiceMessage};
use tokio::sync::mpsc;

use crate::client::ClientInner;
use crate::{ClientEvent, ClientEventBus};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct CallbackSink {
    jobs: mpsc::UnboundedSender<Job>,
    session: Mutex<Weak<ClientInner>>,
    disposed: AtomicBool,
    bus: ClientEventBus,
}

impl CallbackSink {
    /// Creates the sink and spawns its consumer task.
    pub(crate) fn new(bus: ClientEventBus) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
            tracing::debug!("callback sink event loop stopped");
        });
        Self {
            jobs,
            session: Mutex::new(Weak::new()),
            disposed: AtomicBool::new(false),
            bus,
        }
    }

    /// Installs the back-reference to the owning session.
    pub(crate) fn bind_session(&self, session: Weak<ClientInner>) {
        *self.session.lock().unwrap() = session;
    }

    /// Enqueues one unit of work on the event loop. Returns immediately;
    /// jobs run strictly in submission order. No-op after disposal.
    pub(crate) fn post(&self, job: Job) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        // Send fails only if the consumer task is gone; nothing to do then.
        let _ = self.jobs.send(job);
    }

    /// Enqueues the publication of a single event.
    pub(crate) fn post_event(&self, event: ClientEvent) {
        let bus = self.bus.clone();
        self.post(Box::new(move || bus.publish_event(event)));
    }

    /// Routes one inbound push notification onto the event loop.
    pub(crate) fn deliver(&self, msg: ServiceMessage) {
        let event = match msg {
            ServiceMessage::NotifyOnJoin { local_player, lobby } => {
                ClientEvent::LocalPlayerJoined {
                    player: local_player,
                    lobby,
                }
            }
            ServiceMessage::NotifyPlayerJoined { player } => {
                ClientEvent::PlayerJoined(player)
            }
            ServiceMessage::NotifyPlayerExited { player } => {
                ClientEvent::PlayerExited(player)
            }
            ServiceMessage::NotifyGameStarting => ClientEvent::GameStarting,
            ServiceMessage::NotifyGameStarted { start } => {
                ClientEvent::GameStarted(start)
            }
            ServiceMessage::NotifyTurnProgressChanged { phase } => {
                ClientEvent::TurnPhaseChanged(phase)
            }
            ServiceMessage::NotifyGameDataUpdated { update } => {
                ClientEvent::GameUpdateReceived(update)
            }
            ServiceMessage::NotifyAllTurnEnded => ClientEvent::AllTurnEnded,
            ServiceMessage::NotifyTurnFinished => ClientEvent::TurnStarted,
            ServiceMessage::NotifyChatMessageReceived {
                sender_id,
                text,
                recipient_id,
            } => ClientEvent::ChatMessageReceived(ChatMessage {
                sender_id,
                text,
                recipient_id,
            }),
            ServiceMessage::NotifyLobbyUpdated { lobby } => {
                ClientEvent::LobbyUpdated(lobby)
            }
            ServiceMessage::NotifyDisconnected => {
                // The host dropped us. Tear the session down off the event
                // loop; disconnect() itself publishes the terminal event.
                let session = self.session.lock().unwrap().clone();
                self.post(Box::new(move || {
                    if let Some(session) = session.upgrade() {
                        tokio::spawn(async move {
                            session
                                .disconnect_with(
                                    ClientDisconnectReason::ConnectionClosed,
                                )
                                .await;
                        });
                    }
                }));
                return;
            }
            ServiceMessage::NotifyCombatUpdate { update } => {
                ClientEvent::CombatUpdateReceived(update)
            }
            ServiceMessage::NotifyInvasionUpdate { update } => {
                ClientEvent::InvasionUpdateReceived(update)
            }
            ServiceMessage::NotifyPlayerFinishedTurn { empire_id } => {
                ClientEvent::PlayerTurnFinished { empire_id }
            }
            ServiceMessage::Ping { ping_id } => {
                ClientEvent::ServerHeartbeat { ping_id }
            }
            other => {
                tracing::debug!(?other, "unexpected message in callback sink");
                return;
            }
        };
        self.post_event(event);
    }

    /// Stops dispatching and drops the session back-reference. Idempotent.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.session.lock().unwrap() = Weak::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supremacy_protocol::TurnPhase;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_deliveries_observed_in_send_order() {
        let bus = ClientEventBus::new();
        let mut rx = bus.subscribe_events();
        let sink = CallbackSink::new(bus);

        for phase in [
            TurnPhase::WaitOnPlayers,
            TurnPhase::FleetMovement,
            TurnPhase::Combat,
            TurnPhase::Production,
        ] {
            sink.deliver(ServiceMessage::NotifyTurnProgressChanged { phase });
        }

        for expected in [
            TurnPhase::WaitOnPlayers,
            TurnPhase::FleetMovement,
            TurnPhase::Combat,
            TurnPhase::Production,
        ] {
            let event = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("event should arrive")
                .expect("bus alive");
            match event {
                ClientEvent::TurnPhaseChanged(phase) => {
                    assert_eq!(phase, expected)
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_disposed_sink_drops_deliveries() {
        let bus = ClientEventBus::new();
        let mut rx = bus.subscribe_events();
        let sink = CallbackSink::new(bus);

        sink.dispose();
        sink.dispose(); // idempotent
        sink.deliver(ServiceMessage::NotifyGameStarting);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ping_maps_to_server_heartbeat() {
        let bus = ClientEventBus::new();
        let mut rx = bus.subscribe_events();
        let sink = CallbackSink::new(bus);

        sink.deliver(ServiceMessage::Ping { ping_id: 7 });

        let event = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(
            matches!(event, ClientEvent::ServerHeartbeat { ping_id: 7 })
        );
    }
}
