//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the presence registry: one entry per open websocket, carrying
//! the connection's cursor/color record and its [`Outbox`].
//! The server keeps no copy of the board itself.
//!
//! All registry mutations take the write lock, and the resulting fan-out is
//! queued before the lock is released, so every connection observes roster
//! and object frames in the order the mutations happened.
//!
//! OUTBOX LANES
//! ============
//! Each connection has two outgoing lanes. Object and roster frames go on an
//! unbounded lane and are never dropped: a replica that misses one diverges
//! for good. Cursor frames go on a bounded lane and are shed when it is
//! full; the next cursor frame supersedes a lost one.

use std::collections::HashMap;
use std::sync::Arc;

use frames::{Presence, ServerFrame};
use tokio::sync::{RwLock, mpsc};

use crate::config::ServerConfig;

// =============================================================================
// OUTBOX
// =============================================================================

/// Sending half of a connection's outgoing lanes.
#[derive(Clone, Debug)]
pub struct Outbox {
    frames: mpsc::UnboundedSender<ServerFrame>,
    cursors: mpsc::Sender<ServerFrame>,
}

/// Receiving half, drained by the connection's socket loop.
#[derive(Debug)]
pub struct Inbox {
    frames: mpsc::UnboundedReceiver<ServerFrame>,
    cursors: mpsc::Receiver<ServerFrame>,
}

/// Create the lanes for one connection. `cursor_capacity` bounds the cursor lane.
#[must_use]
pub fn outbox(cursor_capacity: usize) -> (Outbox, Inbox) {
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let (cursors_tx, cursors_rx) = mpsc::channel(cursor_capacity.max(1));
    (
        Outbox { frames: frames_tx, cursors: cursors_tx },
        Inbox { frames: frames_rx, cursors: cursors_rx },
    )
}

/// Why a frame did not reach a connection's outbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The cursor lane is full; the cursor frame was shed.
    #[error("cursor lane full")]
    CursorShed,
    /// The connection's socket loop has exited.
    #[error("connection closed")]
    Closed,
}

impl Outbox {
    /// Queue one frame without waiting. Only cursor frames can be shed.
    ///
    /// # Errors
    ///
    /// `CursorShed` when the cursor lane is full, `Closed` when the
    /// receiving side is gone.
    pub fn deliver(&self, frame: ServerFrame) -> Result<(), DeliveryError> {
        if frame.is_cursor() {
            return self.cursors.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::CursorShed,
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
            });
        }
        self.frames.send(frame).map_err(|_| DeliveryError::Closed)
    }
}

impl Inbox {
    /// Next outgoing frame. Object and roster frames are preferred over
    /// cursor frames when both are waiting. `None` once both lanes close.
    pub async fn recv(&mut self) -> Option<ServerFrame> {
        tokio::select! {
            biased;
            Some(frame) = self.frames.recv() => Some(frame),
            Some(frame) = self.cursors.recv() => Some(frame),
            else => None,
        }
    }

    /// Non-blocking variant of [`Inbox::recv`].
    ///
    /// # Errors
    ///
    /// Returns the cursor lane's error when both lanes are empty or closed.
    pub fn try_recv(&mut self) -> Result<ServerFrame, mpsc::error::TryRecvError> {
        match self.frames.try_recv() {
            Ok(frame) => Ok(frame),
            Err(_) => self.cursors.try_recv(),
        }
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// One live websocket connection.
pub struct Connection {
    pub presence: Presence,
    /// Outgoing lanes, drained by the connection's socket loop.
    pub outbox: Outbox,
    /// Registration order, used to keep the roster stable.
    pub seq: u64,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Connection id -> live connection. Entries exist only while the socket is open.
#[derive(Default)]
pub struct Registry {
    connections: HashMap<String, Connection>,
    next_seq: u64,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection with the given presence, replacing any entry with the same id.
    pub fn insert(&mut self, presence: Presence, outbox: Outbox) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.connections
            .insert(presence.id.clone(), Connection { presence, outbox, seq });
    }

    /// Remove a connection, returning its last presence.
    pub fn remove(&mut self, id: &str) -> Option<Presence> {
        self.connections.remove(id).map(|c| c.presence)
    }

    /// Update a connection's cursor in place and return the updated presence.
    pub fn set_cursor(&mut self, id: &str, x: f64, y: f64) -> Option<Presence> {
        let conn = self.connections.get_mut(id)?;
        conn.presence.x = x;
        conn.presence.y = y;
        Some(conn.presence.clone())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Presence> {
        self.connections.get(id).map(|c| &c.presence)
    }

    /// Full roster in registration order.
    #[must_use]
    pub fn roster(&self) -> Vec<Presence> {
        let mut conns: Vec<&Connection> = self.connections.values().collect();
        conns.sort_by_key(|c| c.seq);
        conns.into_iter().map(|c| c.presence.clone()).collect()
    }

    /// Iterate `(id, outbox)` pairs for fan-out.
    pub fn outboxes(&self) -> impl Iterator<Item = (&str, &Outbox)> {
        self.connections
            .iter()
            .map(|(id, c)| (id.as_str(), &c.outbox))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    /// Capacity of each connection's cursor lane.
    pub channel_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self { registry: Arc::new(RwLock::new(Registry::new())), channel_capacity: config.client_channel_capacity }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
