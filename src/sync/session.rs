use crate::state::{Origin, WorldUpdate};
use crate::sync::hub::SyncHub;
use crate::sync::protocol;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Drive one subscriber connection to completion.
///
/// On entry the connection is registered and handed the greeting plus the
/// full world snapshot; then the inbound and outbound halves run as
/// separate tasks. Either half ending aborts the other, and the connection
/// is removed from the registry exactly once.
pub async fn run(socket: WebSocket, hub: Arc<SyncHub>, greeting: String) {
    let sub = hub.subscribe();
    let client_id = sub.id;
    let origin = Origin::Client(client_id);
    let mut updates = sub.updates;

    let (mut sender, mut receiver) = socket.split();

    let snapshot = match serde_json::to_string(&sub.snapshot) {
        Ok(json) => json,
        Err(e) => {
            warn!(client = %client_id, error = %e, "failed to serialize snapshot");
            hub.unsubscribe(client_id);
            return;
        }
    };
    // Greeting, then the snapshot, before either half starts.
    if sender.send(Message::Text(greeting)).await.is_err()
        || sender.send(Message::Text(snapshot)).await.is_err()
    {
        info!(client = %client_id, "subscriber left during handshake");
        hub.unsubscribe(client_id);
        return;
    }

    // Outbound half: drain the update ring, skipping records this
    // connection authored.
    let mut send_task = tokio::spawn(async move {
        loop {
            let update = match updates.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(client = %client_id, skipped, "subscriber lagged, updates dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !should_deliver(&update, origin) {
                continue;
            }
            let frame = match protocol::encode_update(&update) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(client = %client_id, error = %e, "failed to encode update, dropping");
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Inbound half: apply client diffs to the store.
    let inbound_hub = Arc::clone(&hub);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match protocol::decode_diff(&text) {
                    Ok(diff) => inbound_hub.apply(diff, origin),
                    Err(e) => {
                        warn!(client = %client_id, error = %e, "malformed client frame, skipping");
                    }
                },
                Ok(Message::Close(_)) => break,
                // Pings are answered by the transport; binary and pong
                // frames carry nothing for us.
                Ok(_) => {}
                Err(e) => {
                    warn!(client = %client_id, error = %e, "websocket error");
                    break;
                }
            }
        }
    });

    // Either half ending tears the other down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unsubscribe(client_id);
}

/// Outbound filter: deliver only records other connections authored.
fn should_deliver(update: &WorldUpdate, origin: Origin) -> bool {
    update.origin != origin
}
