//! Integration tests for the game client session.
//!
//! Each test drives a real [`GameClient`] against a scripted host sitting
//! on the other end of an in-process duplex channel, so the whole stack —
//! envelope codec, reader task, callback scheduler, command pump — is
//! exercised without a network.

use std::sync::Arc;

use supremacy_client::{
    ClientError, ClientEvent, ClientEventBus, GameClient, LocalOrderStore,
    PlayerOrderService,
};
use supremacy_protocol::{
    ClientDisconnectReason, Codec, Envelope, GameOptions, JoinGameResult,
    JsonCodec, LobbyData, ObjectId, Order, Payload, Player, PlayerId,
    PlayerSlot, ServiceMessage, ServiceRequest, SlotId,
};
use supremacy_transport::{
    local_pair, Connection, Listener, ServiceAddress,
};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

/// Handle to a scripted host on the far side of a local channel.
///
/// The host auto-answers `JoinGame` (with the configured result) and
/// `GetNewObjectId` (with sequential ids); every request it receives is
/// also recorded on `requests`. Messages written to `push` are sent to
/// the client verbatim.
struct ScriptedHost {
    requests: mpsc::UnboundedReceiver<ServiceRequest>,
    push: mpsc::UnboundedSender<ServiceMessage>,
}

fn test_lobby(player: &Player) -> LobbyData {
    LobbyData {
        players: vec![player.clone()],
        slots: (0..4)
            .map(|i| {
                PlayerSlot::open(
                    SlotId(i),
                    supremacy_protocol::EmpireId(i as i32),
                )
            })
            .collect(),
        options: GameOptions::default(),
        game_started: false,
    }
}

fn spawn_scripted_host(
    mut listener: supremacy_transport::LocalListener,
    join_result: JoinGameResult,
) -> ScriptedHost {
    let (requests_tx, requests) = mpsc::unbounded_channel();
    let (push, mut push_rx) = mpsc::unbounded_channel::<ServiceMessage>();

    tokio::spawn(async move {
        let conn = listener.accept().await.expect("client should dial");
        let codec = JsonCodec;
        let mut seq = 1u64;
        let mut next_object_id = 100;

        fn encode_msg(
            codec: &JsonCodec,
            msg: ServiceMessage,
            seq: &mut u64,
        ) -> Vec<u8> {
            let envelope = Envelope {
                seq: *seq,
                timestamp: 0,
                payload: Payload::Message(msg),
            };
            *seq += 1;
            codec.encode(&envelope).unwrap()
        }

        loop {
            tokio::select! {
                inbound = conn.recv() => {
                    let Ok(Some(data)) = inbound else { break };
                    let Ok(envelope) = codec.decode::<Envelope>(&data)
                    else { continue };
                    let Payload::Request(request) = envelope.payload
                    else { continue };

                    let reply = match &request {
                        ServiceRequest::JoinGame { player_name, .. } => {
                            let (local_player, lobby) = if join_result
                                == JoinGameResult::Success
                            {
                                let player = Player::new(
                                    PlayerId(1),
                                    player_name.clone(),
                                );
                                let lobby = test_lobby(&player);
                                (Some(player), Some(lobby))
                            } else {
                                (None, None)
                            };
                            Some(ServiceMessage::JoinGameResponse {
                                result: join_result,
                                local_player,
                                lobby,
                            })
                        }
                        ServiceRequest::GetNewObjectId => {
                            let id = ObjectId(next_object_id);
                            next_object_id += 1;
                            Some(ServiceMessage::NewObjectId {
                                object_id: id,
                            })
                        }
                        _ => None,
                    };

                    let _ = requests_tx.send(request);
                    if let Some(msg) = reply {
                        let bytes = encode_msg(&codec, msg, &mut seq);
                        if conn.send(&bytes).await.is_err() {
                            break;
                        }
                    }
                }
                outbound = push_rx.recv() => {
                    let Some(msg) = outbound else { break };
                    let bytes = encode_msg(&codec, msg, &mut seq);
                    if conn.send(&bytes).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    ScriptedHost { requests, push }
}

fn connected_fixture(
    join_result: JoinGameResult,
) -> (GameClient, ClientEventBus, Arc<LocalOrderStore>, ScriptedHost, ServiceAddress)
{
    let (listener, endpoint) = local_pair();
    let host = spawn_scripted_host(listener, join_result);
    let bus = ClientEventBus::new();
    let orders = Arc::new(LocalOrderStore::new());
    let client = GameClient::new(bus.clone(), orders.clone());
    (client, bus, orders, host, ServiceAddress::Local(endpoint))
}

async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<ClientEvent>,
) -> ClientEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event should arrive in time")
        .expect("bus should stay alive")
}

async fn next_request(host: &mut ScriptedHost) -> ServiceRequest {
    timeout(Duration::from_secs(2), host.requests.recv())
        .await
        .expect("request should arrive in time")
        .expect("host should stay alive")
}

// ---------------------------------------------------------------------------
// Connection lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connect_success_publishes_lobby_through_scheduler() {
    let (client, bus, _orders, _host, address) =
        connected_fixture(JoinGameResult::Success);
    let mut events = bus.subscribe_events();

    client.connect("Alice", &address).await.expect("should join");

    assert!(client.is_connected());
    assert_eq!(client.local_player().unwrap().name, "Alice");

    assert!(matches!(next_event(&mut events).await, ClientEvent::Connected));
    match next_event(&mut events).await {
        ClientEvent::LobbyUpdated(lobby) => {
            assert_eq!(lobby.players.len(), 1);
            assert!(!lobby.game_started);
        }
        other => panic!("expected LobbyUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_refused_game_is_full_latches_reason() {
    let (client, bus, _orders, _host, address) =
        connected_fixture(JoinGameResult::GameIsFull);
    let mut events = bus.subscribe_events();

    let result = client.connect("Alice", &address).await;

    match result {
        Err(ClientError::ConnectionRefused(reason)) => {
            assert_eq!(reason, ClientDisconnectReason::GameIsFull)
        }
        other => panic!("expected refusal, got {other:?}"),
    }
    assert!(!client.is_connected());
    assert_eq!(
        client.disconnect_reason(),
        Some(ClientDisconnectReason::GameIsFull)
    );

    // Exactly one Disconnected with the mapped reason; no LobbyUpdated.
    let mut saw_disconnected = 0;
    loop {
        match timeout(Duration::from_millis(300), events.recv()).await {
            Ok(Some(ClientEvent::Disconnected(reason))) => {
                assert_eq!(reason, ClientDisconnectReason::GameIsFull);
                saw_disconnected += 1;
            }
            Ok(Some(ClientEvent::LobbyUpdated(_))) => {
                panic!("no lobby snapshot may be published on refusal")
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    assert_eq!(saw_disconnected, 1);
}

#[tokio::test]
async fn test_double_disconnect_fires_one_terminal_event() {
    let (client, bus, _orders, _host, address) =
        connected_fixture(JoinGameResult::Success);
    let mut events = bus.subscribe_events();

    client.connect("Alice", &address).await.unwrap();
    client.disconnect().await;
    client.disconnect().await;
    client.dispose().await;

    let mut terminal = 0;
    loop {
        match timeout(Duration::from_millis(300), events.recv()).await {
            Ok(Some(ClientEvent::Disconnected(reason))) => {
                assert_eq!(reason, ClientDisconnectReason::Disconnected);
                terminal += 1;
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    assert_eq!(terminal, 1);
    assert!(!client.is_connected());
}

// ---------------------------------------------------------------------------
// Notification ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notifications_observed_in_send_order() {
    let (client, bus, _orders, host, address) =
        connected_fixture(JoinGameResult::Success);
    let mut events = bus.subscribe_events();

    client.connect("Alice", &address).await.unwrap();

    for i in 0..50 {
        host.push
            .send(ServiceMessage::NotifyChatMessageReceived {
                sender_id: PlayerId(0),
                text: i.to_string(),
                recipient_id: None,
            })
            .unwrap();
    }

    let mut expected = 0;
    while expected < 50 {
        match next_event(&mut events).await {
            ClientEvent::ChatMessageReceived(msg) => {
                assert_eq!(msg.text, expected.to_string());
                expected += 1;
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_end_turn_flushes_final_batch_and_all_turn_ended_clears() {
    let (client, bus, orders, mut host, address) =
        connected_fixture(JoinGameResult::Success);
    let mut events = bus.subscribe_events();

    client.connect("Alice", &address).await.unwrap();
    next_request(&mut host).await; // JoinGame

    // Mutations before end-of-turn do not hit the network.
    for i in 1..=5 {
        orders.add_order(Order {
            object_id: ObjectId(i),
            directive: vec![i as u8],
        });
    }

    client.end_turn();

    match next_request(&mut host).await {
        ServiceRequest::EndTurn { orders: batch } => {
            assert_eq!(batch.orders.len(), 5);
            assert_eq!(batch.orders[4].object_id, ObjectId(5));
        }
        other => panic!("expected EndTurn, got {other:?}"),
    }

    // Post-end-of-turn mutations push the full batch again.
    orders.add_order(Order {
        object_id: ObjectId(6),
        directive: vec![6],
    });
    match next_request(&mut host).await {
        ServiceRequest::EndTurn { orders: batch } => {
            assert_eq!(batch.orders.len(), 6);
        }
        other => panic!("expected EndTurn, got {other:?}"),
    }

    // AllTurnEnded clears local orders.
    host.push.send(ServiceMessage::NotifyAllTurnEnded).unwrap();
    loop {
        if matches!(next_event(&mut events).await, ClientEvent::AllTurnEnded)
        {
            break;
        }
    }
    // The pump clears after observing the event; give it a beat.
    timeout(Duration::from_secs(2), async {
        while !orders.orders().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("orders should be cleared after AllTurnEnded");
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_server_ping_answered_with_pong() {
    let (client, _bus, _orders, mut host, address) =
        connected_fixture(JoinGameResult::Success);

    client.connect("Alice", &address).await.unwrap();
    next_request(&mut host).await; // JoinGame

    host.push.send(ServiceMessage::Ping { ping_id: 0 }).unwrap();

    match next_request(&mut host).await {
        ServiceRequest::Pong { ping_id } => assert_eq!(ping_id, 0),
        other => panic!("expected Pong, got {other:?}"),
    }
    assert!(client.is_connected());
}

// ---------------------------------------------------------------------------
// Object-id allocation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_concurrent_object_id_calls_get_distinct_ids() {
    let (client, _bus, _orders, _host, address) =
        connected_fixture(JoinGameResult::Success);

    client.connect("Alice", &address).await.unwrap();
    let client = Arc::new(client);

    let a = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.new_object_id().await })
    };
    let b = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.new_object_id().await })
    };

    let id_a = a.await.unwrap().expect("first id");
    let id_b = b.await.unwrap().expect("second id");

    assert_ne!(id_a, id_b);
    assert!(id_a.0 >= 100 && id_b.0 >= 100);
}

// ---------------------------------------------------------------------------
// Host-initiated teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_host_notify_disconnected_tears_session_down() {
    let (client, bus, _orders, host, address) =
        connected_fixture(JoinGameResult::Success);
    let mut events = bus.subscribe_events();

    client.connect("Alice", &address).await.unwrap();

    host.push.send(ServiceMessage::NotifyDisconnected).unwrap();

    loop {
        match next_event(&mut events).await {
            ClientEvent::Disconnected(reason) => {
                assert_eq!(
                    reason,
                    ClientDisconnectReason::ConnectionClosed
                );
                break;
            }
            _ => {}
        }
    }
    assert!(!client.is_connected());
}
