//! Presence service: connect/disconnect roster and cursor positions.
//!
//! DESIGN
//! ======
//! Presence is purely ephemeral: created when a socket connects, mutated
//! only by that socket's cursor frames, removed on disconnect. Each mutation
//! and the broadcast it produces happen under one write lock, so a roster
//! frame always reflects the registry at the moment it was queued.

use frames::{Presence, ServerFrame};
use rand::Rng;
use tracing::info;

use crate::services::relay::fan_out;
use crate::state::{AppState, Outbox};

/// Random `#rrggbb` display color.
#[must_use]
pub fn random_color() -> String {
    let rgb: u32 = rand::rng().random_range(0..=0x00FF_FFFF);
    format!("#{rgb:06x}")
}

/// Register a new connection with cursor (0,0) and a random color, then send
/// the full roster to every connection, the new one included.
pub async fn register(state: &AppState, client_id: &str, outbox: Outbox) -> Presence {
    let presence = Presence { id: client_id.to_owned(), x: 0.0, y: 0.0, color: random_color() };

    let mut registry = state.registry.write().await;
    registry.insert(presence.clone(), outbox);
    let roster = ServerFrame::UsersUpdate(registry.roster());
    fan_out(&registry, &roster, None);

    info!(%client_id, color = %presence.color, users = registry.len(), "presence: registered");
    presence
}

/// Store the sender's new cursor position and forward it to everyone else.
/// Unknown connections are ignored.
pub async fn move_cursor(state: &AppState, client_id: &str, x: f64, y: f64) -> Option<Presence> {
    let mut registry = state.registry.write().await;
    let presence = registry.set_cursor(client_id, x, y)?;
    fan_out(&registry, &ServerFrame::CursorUpdate(presence.clone()), Some(client_id));
    Some(presence)
}

/// Remove a connection and send the shrunken roster to everyone left.
pub async fn unregister(state: &AppState, client_id: &str) -> Option<Presence> {
    let mut registry = state.registry.write().await;
    let removed = registry.remove(client_id)?;
    let roster = ServerFrame::UsersUpdate(registry.roster());
    fan_out(&registry, &roster, None);

    info!(%client_id, users = registry.len(), "presence: unregistered");
    Some(removed)
}

/// Current roster in registration order.
pub async fn roster(state: &AppState) -> Vec<Presence> {
    state.registry.read().await.roster()
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
