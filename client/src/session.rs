//! Collaborative session: the document replica wired to the relay.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Session` is the client-side entry point. Local gestures call the
//! `add_object`/`update_object`/`delete_object` family, which mutate the
//! replica and emit one frame each. Frames from the relay go through
//! `handle_server_frame`, which applies them with [`Origin::Remote`] and
//! never emits.
//!
//! The session works offline: with no transport, mutations apply locally
//! and emits are skipped.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` opens the transport and returns the inbound frame channel
//! 2. The caller pumps that channel into `handle_server_frame`
//! 3. `terminate` closes the transport and forgets peers; the document stays

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use frames::{
    BoardObject, ClientFrame, CursorPosition, ObjectBody, ObjectPatch, ObjectUpdate, Point, Presence, ServerFrame,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::net::transport::{Transport, TransportError};
use crate::state::doc::{DocStore, Mutation, Origin};
use crate::state::presence::PresenceView;
use crate::state::viewport::Viewport;

/// Relay endpoint used by local development setups.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:4000/ws";

/// One client's view of a shared board.
#[derive(Default)]
pub struct Session {
    store: DocStore,
    presence: PresenceView,
    viewport: Viewport,
    transport: Option<Transport>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing store, e.g. one with a history limit.
    #[must_use]
    pub fn with_store(store: DocStore) -> Self {
        Self { store, ..Self::default() }
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Open a connection to the relay at `url`.
    ///
    /// Returns the channel of inbound frames; feed each one to
    /// [`Session::handle_server_frame`].
    ///
    /// # Errors
    ///
    /// Returns `AlreadyConnected` if a live connection exists, or the
    /// transport's connect error.
    pub async fn connect(&mut self, url: &str) -> Result<mpsc::Receiver<ServerFrame>, TransportError> {
        if self.is_connected() {
            return Err(TransportError::AlreadyConnected);
        }
        if let Some(stale) = self.transport.take() {
            stale.disconnect().await;
        }
        let (transport, inbound) = Transport::connect(url).await?;
        self.transport = Some(transport);
        Ok(inbound)
    }

    /// Close the connection and forget all peers. The document is kept.
    pub async fn terminate(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.disconnect().await;
            info!("session: collaboration terminated");
        }
        self.presence.clear();
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_connected)
    }

    // =========================================================================
    // LOCAL EDITS
    // =========================================================================

    /// Add an object and announce it. Returns `false` for a duplicate id.
    pub fn add_object(&mut self, obj: BoardObject) -> bool {
        self.apply(Mutation::Add(obj), Origin::Local)
    }

    /// Merge `updates` into an object and announce it. Returns `false` for an unknown id.
    pub fn update_object(&mut self, id: impl Into<String>, updates: ObjectPatch) -> bool {
        self.apply(Mutation::Update { id: id.into(), updates }, Origin::Local)
    }

    /// Remove an object and announce it. Returns `false` for an unknown id.
    pub fn delete_object(&mut self, id: impl Into<String>) -> bool {
        self.apply(Mutation::Delete(id.into()), Origin::Local)
    }

    /// Apply a mutation; local ones are emitted, remote ones never are.
    pub fn apply(&mut self, mutation: Mutation, origin: Origin) -> bool {
        let applied = self.store.apply(mutation, origin);
        let changed = applied.changed();
        if let Some(frame) = applied.into_emit() {
            self.emit(&frame);
        }
        changed
    }

    /// Extend a path being drawn by one point and send the whole point list.
    /// Returns `false` if `id` is not a path on this board.
    pub fn append_path_point(&mut self, id: &str, point: Point) -> bool {
        let Some(ObjectBody::Path { points }) = self.store.get(id).map(|o| &o.body) else {
            return false;
        };
        let mut points = points.clone();
        points.push(point);
        self.update_object(id, ObjectPatch::points(points))
    }

    /// Send an update to peers without touching the local replica. Used
    /// when the local view already reflects the change.
    pub fn broadcast_object_update(&self, id: impl Into<String>, updates: ObjectPatch) {
        self.emit(&ClientFrame::ObjectUpdate(ObjectUpdate { id: id.into(), updates }));
    }

    /// Send our pointer position, given in screen coordinates. Returns the
    /// world position that went on the wire.
    pub fn broadcast_cursor(&self, screen: Point) -> Point {
        let world = self.viewport.screen_to_world(screen);
        self.emit(&ClientFrame::CursorMove(CursorPosition { x: world.x, y: world.y }));
        world
    }

    /// Local only; peers are not told.
    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    /// Local only; peers are not told.
    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    /// Clear the local board, history, and viewport. Peers keep their copies.
    pub fn reset_board(&mut self) {
        self.store.reset();
        self.viewport.reset();
    }

    // =========================================================================
    // REMOTE FRAMES
    // =========================================================================

    /// Apply one frame from the relay. Returns whether local state changed.
    pub fn handle_server_frame(&mut self, frame: ServerFrame) -> bool {
        match frame {
            ServerFrame::Connected { id } => {
                info!(%id, "session: identity assigned");
                self.presence.set_self_id(id);
                true
            }
            ServerFrame::UsersUpdate(roster) => {
                self.presence.apply_roster(roster);
                true
            }
            ServerFrame::CursorUpdate(p) => self.presence.apply_cursor(&p),
            ServerFrame::RemoteObjectAdd(obj) => self.apply(Mutation::Add(obj), Origin::Remote),
            ServerFrame::RemoteObjectUpdate(ObjectUpdate { id, updates }) => {
                self.apply(Mutation::Update { id, updates }, Origin::Remote)
            }
            ServerFrame::RemoteObjectDelete(id) => self.apply(Mutation::Delete(id), Origin::Remote),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn objects(&self) -> &[BoardObject] {
        self.store.objects()
    }

    #[must_use]
    pub fn store(&self) -> &DocStore {
        &self.store
    }

    #[must_use]
    pub fn others(&self) -> &[Presence] {
        self.presence.others()
    }

    #[must_use]
    pub fn self_id(&self) -> Option<&str> {
        self.presence.self_id()
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn emit(&self, frame: &ClientFrame) {
        let Some(transport) = &self.transport else {
            debug!(event = frame.event(), "session: offline; frame not sent");
            return;
        };
        match transport.send(frame) {
            Ok(()) => {}
            Err(TransportError::Full) if frame.is_cursor() => {
                debug!("session: cursor frame dropped");
            }
            Err(e) => warn!(error = %e, event = frame.event(), "session: frame not sent"),
        }
    }
}
