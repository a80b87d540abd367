// WebSocket snapshot stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::hub::Subscription;
use crate::models::{BroadcastEnvelope, TelemetrySnapshot};

const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_snapshots(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading the latest snapshot so nothing published in between is lost.
        let subscription = state.hub.subscribe();
        let latest = state.query.network_data();
        if let Err(e) = stream_snapshots(socket, subscription, latest).await {
            tracing::info!("Snapshot stream error: {}", e);
        }
    })
}

/// Sends one envelope; `Ok(false)` when the client is gone or too slow.
async fn send_envelope(socket: &mut WebSocket, envelope: &BroadcastEnvelope) -> anyhow::Result<bool> {
    let json = serde_json::to_string(envelope)?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}

async fn stream_snapshots(
    mut socket: WebSocket,
    mut subscription: Subscription,
    latest: Arc<TelemetrySnapshot>,
) -> anyhow::Result<()> {
    tracing::info!(subscriber = subscription.id(), "Client connected to snapshot stream");

    let mut last_sent = 0;
    if latest.sequence_number > 0 {
        last_sent = latest.sequence_number;
        if !send_envelope(&mut socket, &BroadcastEnvelope::bandwidth_update(latest)).await? {
            return Ok(());
        }
    }

    // First ping one full period after connect, not immediately.
    let mut ping_interval =
        tokio::time::interval_at(tokio::time::Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            envelope = subscription.recv() => {
                let Some(envelope) = envelope else { break };
                if envelope.data.sequence_number <= last_sent {
                    continue;
                }
                last_sent = envelope.data.sequence_number;
                if !send_envelope(&mut socket, &envelope).await? {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(subscriber = subscription.id(), message = %text.as_str(), "Message from client");
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    tracing::info!(subscriber = subscription.id(), "Client left snapshot stream");
    Ok(())
}
