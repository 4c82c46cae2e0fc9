//! End-to-end tests: real `GameClient` sessions against a running
//! `SupremacyServer`, over both the WebSocket listener and the in-process
//! local endpoint.

use std::sync::Arc;

use supremacy_client::{
    ClientError, ClientEvent, ClientEventBus, GameClient, LocalOrderStore,
};
use supremacy_protocol::{
    ClientDisconnectReason, GameInitData, GameOptions, ObjectId, Order,
};
use supremacy_service::{HostHandle, ServiceConfig, SupremacyServer};
use supremacy_transport::ServiceAddress;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, timeout, Duration};

struct TestServer {
    remote: ServiceAddress,
    local: ServiceAddress,
    host: HostHandle,
}

async fn boot_with(config: ServiceConfig) -> TestServer {
    let server = SupremacyServer::builder()
        .config(config)
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should bind an ephemeral port");
    let addr = server.local_addr().expect("bound address");
    let local = ServiceAddress::Local(server.local_endpoint());
    let host = server.host();
    tokio::spawn(server.run());
    TestServer {
        remote: ServiceAddress::Remote {
            host: addr.ip().to_string(),
            port: addr.port(),
        },
        local,
        host,
    }
}

async fn boot(options: GameOptions) -> TestServer {
    boot_with(ServiceConfig {
        options,
        // No background pings unless a test asks for them.
        heartbeat_interval: Duration::ZERO,
        save_dir: std::env::temp_dir().join("supremacy-server-tests"),
        ..ServiceConfig::default()
    })
    .await
}

fn new_client() -> (
    GameClient,
    UnboundedReceiver<ClientEvent>,
    Arc<LocalOrderStore>,
) {
    let bus = ClientEventBus::new();
    let events = bus.subscribe_events();
    let store = Arc::new(LocalOrderStore::new());
    let client = GameClient::new(bus, store.clone());
    (client, events, store)
}

async fn next_event(rx: &mut UnboundedReceiver<ClientEvent>) -> ClientEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event should arrive within the deadline")
        .expect("bus should stay alive")
}

/// Skips events until one matches the predicate.
async fn wait_for(
    rx: &mut UnboundedReceiver<ClientEvent>,
    pred: impl Fn(&ClientEvent) -> bool,
) -> ClientEvent {
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn test_remote_join_lands_in_lobby() {
    let server = boot(GameOptions::default()).await;
    let (client, mut events, _store) = new_client();

    client
        .connect("Alice", &server.remote)
        .await
        .expect("join should succeed");

    assert!(client.is_connected());
    let player = client.local_player().expect("local player set");
    assert_eq!(player.name, "Alice");

    let event = wait_for(&mut events, |e| {
        matches!(e, ClientEvent::LobbyUpdated(_))
    })
    .await;
    let ClientEvent::LobbyUpdated(lobby) = event else {
        unreachable!()
    };
    assert_eq!(lobby.players.len(), 1);
    assert!(lobby.slot_of(player.player_id).is_some());
}

#[tokio::test]
async fn test_join_when_full_is_refused_with_reason() {
    let server = boot(GameOptions {
        max_players: 1,
        ..GameOptions::default()
    })
    .await;

    let (alice, _alice_events, _) = new_client();
    alice.connect("Alice", &server.remote).await.unwrap();

    let (bob, _bob_events, _) = new_client();
    let err = bob
        .connect("Bob", &server.remote)
        .await
        .expect_err("lobby is full");
    assert!(matches!(
        err,
        ClientError::ConnectionRefused(ClientDisconnectReason::GameIsFull)
    ));
    assert_eq!(
        bob.disconnect_reason(),
        Some(ClientDisconnectReason::GameIsFull)
    );
    assert!(!bob.is_connected());
    assert!(alice.is_connected());
}

#[tokio::test]
async fn test_join_after_start_is_refused() {
    let server = boot(GameOptions::default()).await;

    let (host, mut host_events, _) = new_client();
    host.host_and_connect(GameInitData::new_game("Host"), &server.local)
        .await
        .expect("hosting should succeed");
    host.start_game().await;
    wait_for(&mut host_events, |e| {
        matches!(e, ClientEvent::GameStarted(_))
    })
    .await;

    let (late, _late_events, _) = new_client();
    let err = late
        .connect("Late", &server.remote)
        .await
        .expect_err("game already started");
    assert!(matches!(
        err,
        ClientError::ConnectionRefused(
            ClientDisconnectReason::GameAlreadyStarted
        )
    ));
}

#[tokio::test]
async fn test_local_host_and_remote_player_complete_a_turn() {
    let server = boot(GameOptions::default()).await;

    let (host, mut host_events, host_store) = new_client();
    host.host_and_connect(GameInitData::new_game("Host"), &server.local)
        .await
        .unwrap();
    assert!(host.local_player().unwrap().is_game_host());

    let (bob, mut bob_events, bob_store) = new_client();
    bob.connect("Bob", &server.remote).await.unwrap();

    wait_for(&mut host_events, |e| {
        matches!(e, ClientEvent::PlayerJoined(p) if p.name == "Bob")
    })
    .await;

    host.start_game().await;
    for events in [&mut host_events, &mut bob_events] {
        let event = wait_for(events, |e| {
            matches!(e, ClientEvent::GameStarted(_))
        })
        .await;
        let ClientEvent::GameStarted(start) = event else {
            unreachable!()
        };
        assert_eq!(start.turn, 1);
    }

    host_store.add_order(Order {
        object_id: ObjectId(10),
        directive: vec![1],
    });
    bob_store.add_order(Order {
        object_id: ObjectId(20),
        directive: vec![2],
    });
    host.end_turn();
    bob.end_turn();

    // Both sessions observe resolution and the next turn starting.
    for events in [&mut host_events, &mut bob_events] {
        wait_for(events, |e| matches!(e, ClientEvent::AllTurnEnded)).await;
        wait_for(events, |e| matches!(e, ClientEvent::TurnStarted)).await;
    }
    assert_eq!(host.current_turn(), 2);
    assert_eq!(bob.current_turn(), 2);

    // Local batches were dropped when the turn resolved.
    use supremacy_client::PlayerOrderService;
    assert!(host_store.orders().is_empty());
    assert!(bob_store.orders().is_empty());
}

#[tokio::test]
async fn test_object_ids_unique_across_clients() {
    let server = boot(GameOptions::default()).await;

    let (alice, _a_events, _) = new_client();
    alice.connect("Alice", &server.remote).await.unwrap();
    let (bob, _b_events, _) = new_client();
    bob.connect("Bob", &server.remote).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        ids.push(alice.new_object_id().await.unwrap());
        ids.push(bob.new_object_id().await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "object ids must never collide");
}

#[tokio::test]
async fn test_chat_broadcast_reaches_other_player() {
    let server = boot(GameOptions::default()).await;

    let (alice, _a_events, _) = new_client();
    alice.connect("Alice", &server.remote).await.unwrap();
    let alice_id = alice.local_player().unwrap().player_id;

    let (bob, mut bob_events, _) = new_client();
    bob.connect("Bob", &server.remote).await.unwrap();

    alice.send_chat_message("hello there", None).await;

    let event = wait_for(&mut bob_events, |e| {
        matches!(e, ClientEvent::ChatMessageReceived(_))
    })
    .await;
    let ClientEvent::ChatMessageReceived(chat) = event else {
        unreachable!()
    };
    assert_eq!(chat.sender_id, alice_id);
    assert_eq!(chat.text, "hello there");
    assert!(chat.is_broadcast());
}

#[tokio::test]
async fn test_heartbeat_keeps_responsive_client_connected() {
    let server = boot_with(ServiceConfig {
        heartbeat_interval: Duration::from_millis(100),
        max_missed_pings: 2,
        save_dir: std::env::temp_dir().join("supremacy-server-tests"),
        ..ServiceConfig::default()
    })
    .await;

    let (client, _events, _) = new_client();
    client.connect("Alice", &server.remote).await.unwrap();

    // Several heartbeat rounds pass; the session answers every ping, so
    // the host never drops it.
    sleep(Duration::from_millis(600)).await;
    assert!(client.is_connected());
    let lobby = server.host.lobby().await.unwrap();
    assert_eq!(lobby.players.len(), 1);
}

#[tokio::test]
async fn test_disconnect_frees_the_slot_for_the_next_player() {
    let server = boot(GameOptions {
        max_players: 1,
        ..GameOptions::default()
    })
    .await;

    let (alice, _a_events, _) = new_client();
    alice.connect("Alice", &server.remote).await.unwrap();
    alice.disconnect().await;

    // The host processes the departure asynchronously.
    let mut admitted = false;
    for _ in 0..50 {
        sleep(Duration::from_millis(20)).await;
        if server.host.lobby().await.unwrap().players.is_empty() {
            admitted = true;
            break;
        }
    }
    assert!(admitted, "host should have removed the departed player");

    let (bob, _b_events, _) = new_client();
    bob.connect("Bob", &server.remote)
        .await
        .expect("freed slot should be joinable");
}
