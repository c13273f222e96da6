//! Peer presence as seen by one client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The relay sends the full roster (`users-update`) on every join/leave and
//! single-entry `cursor-update` frames in between. Rosters include this
//! client; it is filtered out here so `others` only ever holds peers.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use frames::Presence;

/// Other connected users, in roster order.
#[derive(Clone, Debug, Default)]
pub struct PresenceView {
    self_id: Option<String>,
    others: Vec<Presence>,
}

impl PresenceView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection id assigned by the relay, once known.
    #[must_use]
    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    /// Record our own connection id and drop it from `others` if present.
    pub fn set_self_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.others.retain(|p| p.id != id);
        self.self_id = Some(id);
    }

    #[must_use]
    pub fn others(&self) -> &[Presence] {
        &self.others
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Presence> {
        self.others.iter().find(|p| p.id == id)
    }

    /// Replace the peer list with `roster`, minus our own entry.
    pub fn apply_roster(&mut self, roster: Vec<Presence>) {
        let self_id = self.self_id.as_deref();
        self.others = roster.into_iter().filter(|p| Some(p.id.as_str()) != self_id).collect();
    }

    /// Replace one peer's record with the relayed update. Unknown ids and our
    /// own id are ignored; the next roster is authoritative for membership.
    pub fn apply_cursor(&mut self, update: &Presence) -> bool {
        if self.self_id.as_deref() == Some(update.id.as_str()) {
            return false;
        }
        let Some(peer) = self.others.iter_mut().find(|p| p.id == update.id) else {
            return false;
        };
        peer.clone_from(update);
        true
    }

    /// Forget all peers and our own id (on disconnect).
    pub fn clear(&mut self) {
        self.self_id = None;
        self.others.clear();
    }
}
