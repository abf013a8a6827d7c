// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for staff realtime sessions.
//!
//! Client -> Server (JSON):
//! ```json
//! {"message": "hello there", "sender_id": "staff-7"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"message": "hello there", "sender_id": "staff-7", "timestamp": "..."}
//! {"error": "received empty message"}
//! ```
//!
//! Connection lifecycle: resolve the customer's conversation (failure sends
//! one error frame and closes), join the customer's room, replay stored
//! history oldest-first, then pump client frames and room events until
//! disconnect. The room subscription is a guard, so teardown always leaves
//! the room.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use spout_core::types::MessageEvent;

use crate::server::GatewayState;

/// WebSocket frame from the client.
#[derive(Debug, Deserialize)]
struct WsIncoming {
    message: String,
    #[serde(default)]
    sender_id: Option<String>,
}

/// Validate a raw client frame into a usable message.
///
/// Empty/whitespace frames, unparsable JSON, and empty message bodies are
/// all rejected with the error string to echo back; the connection stays
/// open either way.
fn validate_frame(text: &str) -> Result<WsIncoming, &'static str> {
    if text.trim().is_empty() {
        return Err("received empty message");
    }
    let incoming: WsIncoming =
        serde_json::from_str(text).map_err(|_| "invalid JSON format")?;
    if incoming.message.trim().is_empty() {
        return Err("received empty message");
    }
    Ok(incoming)
}

/// WebSocket upgrade handler for `GET /ws/chat/{customer_id}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(customer_id): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, customer_id))
}

/// Handle an individual staff WebSocket connection.
async fn handle_socket(socket: WebSocket, state: GatewayState, customer_id: String) {
    let (mut sender, receiver) = socket.split();

    // Connecting: resolve the conversation before accepting any traffic.
    let conversation_id = match state
        .store
        .resolve_or_create(&customer_id, &state.vendor_id)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            error!(%customer_id, error = %e, "conversation resolution failed on connect");
            let _ = send_error(&mut sender, "failed to resolve conversation").await;
            let _ = sender.close().await;
            return;
        }
    };
    debug!(%customer_id, %conversation_id, "realtime session connected");

    // Join the room before replaying so no live event published during the
    // replay is missed.
    let mut subscription = state.rooms.subscribe(&customer_id);

    // Replay the stored backlog, oldest first.
    match state.store.history(&customer_id).await {
        Ok(backlog) => {
            for msg in &backlog {
                if send_event(&mut sender, &MessageEvent::from_message(msg))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }
        Err(e) => {
            error!(%customer_id, error = %e, "history replay failed");
            if send_error(&mut sender, "failed to fetch message history")
                .await
                .is_err()
            {
                return;
            }
        }
    }

    // Open: pump client frames and room events until either side goes away.
    pump(&state, &customer_id, &conversation_id, &mut sender, receiver, &mut subscription).await;

    debug!(%customer_id, "realtime session closed");
    // Dropping `subscription` leaves the room.
}

async fn pump(
    state: &GatewayState,
    customer_id: &str,
    conversation_id: &str,
    sender: &mut SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    subscription: &mut spout_rooms::RoomSubscription,
) {
    loop {
        tokio::select! {
            maybe_frame = receiver.next() => {
                let Some(Ok(frame)) = maybe_frame else { break };
                match frame {
                    Message::Text(text) => {
                        if handle_client_frame(state, customer_id, conversation_id, text.as_str(), sender)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {} // Ignore binary, ping/pong (handled by the ws layer).
                }
            }
            maybe_event = subscription.recv() => {
                let Some(event) = maybe_event else { break };
                if send_event(sender, &event).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Process one inbound client frame: validate, append, publish, and kick
/// off the fire-and-forget outbound delivery.
///
/// Returns `Err` only when the socket itself is gone; store failures keep
/// the connection open and surface as an error frame.
async fn handle_client_frame(
    state: &GatewayState,
    customer_id: &str,
    conversation_id: &str,
    text: &str,
    sender: &mut SplitSink<WebSocket, Message>,
) -> Result<(), axum::Error> {
    let incoming = match validate_frame(text) {
        Ok(incoming) => incoming,
        Err(reason) => {
            warn!(customer_id, reason, "rejected client frame");
            return send_error(sender, reason).await;
        }
    };

    let msg = match state
        .store
        .append(
            customer_id,
            conversation_id,
            incoming.sender_id,
            &incoming.message,
        )
        .await
    {
        Ok(msg) => msg,
        Err(e) => {
            error!(customer_id, error = %e, "failed to store message");
            return send_error(sender, "failed to store message").await;
        }
    };

    // Everyone in the room sees it, including this connection.
    state.rooms.publish(customer_id, &MessageEvent::from_message(&msg));

    // Outbound to the provider runs off the realtime path. The client's
    // send timeout bounds it; the outcome is logged, never awaited here.
    let outbound = Arc::clone(&state.outbound);
    let to = customer_id.to_string();
    let body = msg.message.clone();
    tokio::spawn(async move {
        let outcome = outbound.send_text(&to, &body).await;
        if !outcome.is_delivered() {
            warn!(%to, ?outcome, "outbound delivery did not complete");
        }
    });

    Ok(())
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &MessageEvent,
) -> Result<(), axum::Error> {
    let frame = serde_json::to_string(event)
        .map_err(|e| axum::Error::new(Box::new(e)))?;
    sender.send(Message::Text(frame.into())).await
}

async fn send_error(
    sender: &mut SplitSink<WebSocket, Message>,
    reason: &str,
) -> Result<(), axum::Error> {
    let frame = serde_json::json!({"error": reason}).to_string();
    sender.send(Message::Text(frame.into())).await
}
