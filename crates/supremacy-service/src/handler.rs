//! Per-connection handler.
//!
//! One handler task runs per accepted connection. Protocol order:
//!
//! 1. The very first envelope must be a `HostGame` or `JoinGame` request,
//!    within the handshake timeout. Anything else drops the connection.
//! 2. The matching response is written directly by the handler, *before*
//!    the outbound pump starts, so the response always beats any push
//!    notification queued during the handshake.
//! 3. Afterwards the handler splits: a pump task drains the player's
//!    outbound queue onto the wire while the handler loops on inbound
//!    requests and forwards them to the host actor.
//!
//! Every outbound message shares one per-connection sequence counter, so
//! `Envelope::seq` stays strictly increasing across the handshake response
//! and everything the pump sends after it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use supremacy_protocol::{
    Codec, Envelope, JsonCodec, Payload, ServiceMessage, ServiceRequest,
};
use supremacy_transport::Connection;
use tokio::sync::mpsc;

use crate::{HostHandle, ServiceError};

/// Drives one client connection from accept to teardown.
pub(crate) async fn handle_connection<C>(
    conn: C,
    host: HostHandle,
    handshake_timeout: Duration,
) where
    C: Connection,
{
    let conn = Arc::new(conn);
    let codec = JsonCodec;
    let started = Instant::now();
    let mut seq = 0u64;

    let first = match tokio::time::timeout(
        handshake_timeout,
        recv_request(&*conn, &codec),
    )
    .await
    {
        Ok(Ok(Some(request))) => request,
        Ok(Ok(None)) => {
            tracing::debug!(id = %conn.id(), "closed before handshake");
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(id = %conn.id(), error = %e, "handshake failed");
            let _ = conn.close().await;
            return;
        }
        Err(_) => {
            tracing::warn!(id = %conn.id(), "handshake timed out");
            let _ = conn.close().await;
            return;
        }
    };

    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (local_player, response) = match first {
        ServiceRequest::HostGame {
            init_data,
            protocol_version,
        } => {
            let Ok((result, local_player, lobby)) = host
                .host_game(conn.id(), init_data, protocol_version, out_tx)
                .await
            else {
                let _ = conn.close().await;
                return;
            };
            (
                local_player.clone(),
                ServiceMessage::HostGameResponse {
                    result,
                    local_player,
                    lobby,
                },
            )
        }
        ServiceRequest::JoinGame {
            player_name,
            protocol_version,
        } => {
            let Ok((result, local_player, lobby)) = host
                .join_game(conn.id(), player_name, protocol_version, out_tx)
                .await
            else {
                let _ = conn.close().await;
                return;
            };
            (
                local_player.clone(),
                ServiceMessage::JoinGameResponse {
                    result,
                    local_player,
                    lobby,
                },
            )
        }
        _ => {
            tracing::warn!(
                id = %conn.id(),
                "first request was not a handshake, dropping"
            );
            let _ = conn.close().await;
            return;
        }
    };

    if let Err(e) =
        send_message(&*conn, &codec, &mut seq, started, response).await
    {
        tracing::debug!(id = %conn.id(), error = %e, "response send failed");
        return;
    }

    let Some(player) = local_player else {
        // Refused handshake; the response says why.
        let _ = conn.close().await;
        return;
    };
    let player_id = player.player_id;
    tracing::info!(id = %conn.id(), player = %player_id, "session established");

    // Outbound pump: host → wire. Ends when the host drops this player's
    // queue or the wire breaks.
    let pump_conn = Arc::clone(&conn);
    let mut pump = tokio::spawn(async move {
        let codec = JsonCodec;
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) =
                send_message(&*pump_conn, &codec, &mut seq, started, msg)
                    .await
            {
                tracing::debug!(
                    id = %pump_conn.id(), error = %e,
                    "outbound send failed, pump stopping"
                );
                break;
            }
        }
    });

    // Inbound loop: wire → host.
    loop {
        match recv_request(&*conn, &codec).await {
            Ok(Some(ServiceRequest::Disconnect)) => {
                tracing::debug!(id = %conn.id(), player = %player_id, "client disconnecting");
                let _ =
                    host.request(player_id, ServiceRequest::Disconnect).await;
                break;
            }
            Ok(Some(request)) => {
                if host.request(player_id, request).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(id = %conn.id(), player = %player_id, "peer closed");
                let _ = host.player_dropped(player_id).await;
                break;
            }
            Err(e) => {
                tracing::warn!(
                    id = %conn.id(), player = %player_id, error = %e,
                    "connection faulted"
                );
                let _ = host.player_dropped(player_id).await;
                break;
            }
        }
    }

    // Give the pump a moment to flush what the host already queued (its
    // sender is dropped when the player is removed), then cut it.
    if tokio::time::timeout(Duration::from_secs(1), &mut pump)
        .await
        .is_err()
    {
        pump.abort();
    }
    let _ = conn.close().await;
    tracing::debug!(id = %conn.id(), player = %player_id, "handler finished");
}

/// Reads envelopes until a request arrives. `Ok(None)` means the peer
/// closed cleanly.
async fn recv_request<C: Connection>(
    conn: &C,
    codec: &JsonCodec,
) -> Result<Option<ServiceRequest>, ServiceError> {
    loop {
        let Some(bytes) = conn.recv().await? else {
            return Ok(None);
        };
        let envelope: Envelope = codec.decode(&bytes)?;
        match envelope.payload {
            Payload::Request(request) => return Ok(Some(request)),
            Payload::Message(_) => {
                tracing::debug!(
                    id = %conn.id(),
                    "client sent a host-side message, ignoring"
                );
            }
        }
    }
}

async fn send_message<C: Connection>(
    conn: &C,
    codec: &JsonCodec,
    seq: &mut u64,
    started: Instant,
    msg: ServiceMessage,
) -> Result<(), ServiceError> {
    *seq += 1;
    let envelope = Envelope {
        seq: *seq,
        timestamp: started.elapsed().as_millis() as u64,
        payload: Payload::Message(msg),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}
