//! WebSocket handler: presence registration and frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection id and enters a `select!` loop:
//! - Incoming client frames → decode → relay service
//! - Frames queued by peers (roster, cursors, objects) → forward to client
//!
//! Frames from one connection are handled one at a time in arrival order,
//! so per-connection ordering is preserved through the relay. No ordering
//! is promised across connections.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `connected` with the connection id
//! 2. Register presence → everyone (including us) gets `users-update`
//! 3. Client sends frames → relay fans out to peers
//! 4. Close → unregister → remaining connections get `users-update`
//!
//! A reconnect is a brand new connection: new id, new color.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{ClientFrame, ServerFrame};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services;
use crate::state::{self as registry_state, AppState};

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4().to_string();

    // Per-connection lanes for frames fanned out by the registry.
    let (outbox, mut inbox) = registry_state::outbox(state.channel_capacity);

    // The client learns its own id before the first roster arrives.
    let welcome = ServerFrame::Connected { id: client_id.clone() };
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    services::presence::register(&state, &client_id, outbox).await;
    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, &client_id, text.as_str()).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = inbox.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    services::presence::unregister(&state, &client_id).await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode one inbound text frame and hand it to the relay.
///
/// Undecodable frames are logged and dropped; the connection stays open.
pub(crate) async fn process_inbound_text(state: &AppState, client_id: &str, text: &str) {
    let frame: ClientFrame = match frames::decode_frame(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return;
        }
    };

    if frame.is_cursor() {
        debug!(%client_id, "ws: recv cursor-move");
    } else {
        info!(%client_id, event = frame.event(), "ws: recv frame");
    }

    services::relay::handle_client_frame(state, client_id, frame).await;
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), ()> {
    let text = match frames::encode_frame(frame) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, event = frame.event(), "ws: failed to encode frame");
            return Err(());
        }
    };
    if !frame.is_cursor() {
        debug!(event = frame.event(), "ws: send frame");
    }
    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
