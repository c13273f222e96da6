//! Relay service: stateless fan-out of object and cursor frames.
//!
//! DESIGN
//! ======
//! The relay never stores or validates board objects. Each inbound object
//! frame is re-labelled as its `remote-*` counterpart and forwarded to every
//! connection except the sender. Late joiners get no backlog.
//!
//! Object frames are never shed: each peer's object lane is unbounded, so a
//! slow reader delays its replica instead of diverging it. Cursor frames are
//! best-effort and are shed when a peer's cursor lane is full.

use frames::{ClientFrame, ServerFrame};
use tracing::{debug, warn};

use crate::services::presence;
use crate::state::{AppState, DeliveryError, Registry};

/// Map a client frame to the frame its peers receive. Cursor moves are not
/// relayed verbatim; they go through the presence registry.
#[must_use]
pub fn relayed(frame: ClientFrame) -> Option<ServerFrame> {
    match frame {
        ClientFrame::CursorMove(_) => None,
        ClientFrame::ObjectAdd(obj) => Some(ServerFrame::RemoteObjectAdd(obj)),
        ClientFrame::ObjectUpdate(update) => Some(ServerFrame::RemoteObjectUpdate(update)),
        ClientFrame::ObjectDelete(id) => Some(ServerFrame::RemoteObjectDelete(id)),
    }
}

/// Apply one inbound frame from `client_id`.
pub async fn handle_client_frame(state: &AppState, client_id: &str, frame: ClientFrame) {
    if let ClientFrame::CursorMove(pos) = frame {
        if presence::move_cursor(state, client_id, pos.x, pos.y)
            .await
            .is_none()
        {
            debug!(%client_id, "relay: cursor from unregistered connection dropped");
        }
        return;
    }

    if let Some(out) = relayed(frame) {
        broadcast(state, &out, Some(client_id)).await;
    }
}

/// Broadcast a frame to all connections, optionally excluding one.
pub async fn broadcast(state: &AppState, frame: &ServerFrame, exclude: Option<&str>) -> usize {
    let registry = state.registry.read().await;
    fan_out(&registry, frame, exclude)
}

/// Queue `frame` on every connection's outbox except `exclude`. Returns the
/// number of connections the frame was queued for.
pub(crate) fn fan_out(registry: &Registry, frame: &ServerFrame, exclude: Option<&str>) -> usize {
    let mut delivered = 0;
    for (client_id, outbox) in registry.outboxes() {
        if exclude == Some(client_id) {
            continue;
        }
        match outbox.deliver(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(DeliveryError::CursorShed) => {
                debug!(%client_id, "relay: cursor frame shed for slow peer");
            }
            Err(e @ DeliveryError::Closed) => {
                warn!(%client_id, event = frame.event(), error = %e, "relay: peer outbox closed");
            }
        }
    }
    delivered
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
