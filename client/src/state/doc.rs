//! Document replica: board objects plus snapshot-based undo/redo.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every client owns a full replica of the board. Local gestures mutate it
//! optimistically and produce a wire frame for the relay; frames relayed
//! from peers are applied through the same path with [`Origin::Remote`], which
//! never produces a frame, so remote edits cannot echo back onto the wire.
//!
//! UNDO MODEL
//! ==========
//! History entries are whole-document snapshots taken immediately before an
//! add or a delete. Updates (drags, typing, path points) are not recorded.
//! Undo/redo are local only; they are not broadcast and peers keep their
//! own state. Remote adds and deletes are recorded like local ones.
//!
//! Growth is unbounded unless a history limit is configured.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use frames::{BoardObject, ClientFrame, ObjectPatch, ObjectUpdate};
use tracing::debug;
use uuid::Uuid;

/// Whole-document copy used as the unit of undo/redo.
pub type Snapshot = Vec<BoardObject>;

/// Fresh id for a locally created object. Ids are globally unique, so
/// concurrent adds from different clients never collide.
#[must_use]
pub fn new_object_id() -> String {
    Uuid::new_v4().to_string()
}

/// Where a mutation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Produced by this replica; must be sent to peers.
    Local,
    /// Relayed from a peer; must not be sent again.
    Remote,
}

/// One document mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Add(BoardObject),
    Update { id: String, updates: ObjectPatch },
    Delete(String),
}

impl Mutation {
    /// Wire frame announcing this mutation to peers.
    #[must_use]
    pub fn into_frame(self) -> ClientFrame {
        match self {
            Self::Add(obj) => ClientFrame::ObjectAdd(obj),
            Self::Update { id, updates } => ClientFrame::ObjectUpdate(ObjectUpdate { id, updates }),
            Self::Delete(id) => ClientFrame::ObjectDelete(id),
        }
    }
}

/// Outcome of [`DocStore::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    /// Duplicate add or unknown target; nothing changed.
    Ignored,
    /// The replica changed. `emit` is the frame to send, present only for
    /// local mutations.
    Changed { emit: Option<ClientFrame> },
}

impl Applied {
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Take the frame to send, if any.
    #[must_use]
    pub fn into_emit(self) -> Option<ClientFrame> {
        match self {
            Self::Changed { emit } => emit,
            Self::Ignored => None,
        }
    }
}

/// In-memory replica of the board with undo/redo stacks.
#[derive(Clone, Debug, Default)]
pub struct DocStore {
    /// Live objects in insertion order.
    objects: Vec<BoardObject>,
    /// Snapshots taken before each add/delete; most recent last.
    history: Vec<Snapshot>,
    /// Snapshots displaced by undo; most recently undone last.
    redo: Vec<Snapshot>,
    /// Oldest history entries are evicted past this length. `None` keeps all.
    history_limit: Option<usize>,
}

impl DocStore {
    /// Create an empty store with unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that keeps at most `limit` undo steps.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self { history_limit: Some(limit), ..Self::default() }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// All objects in insertion order (back to front).
    #[must_use]
    pub fn objects(&self) -> &[BoardObject] {
        &self.objects
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoardObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Copy of the current object set.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.objects.clone()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Apply one mutation. The single entry point for both local and remote edits.
    ///
    /// - `Add`: ignored if the id is already present. Records history, clears redo.
    /// - `Update`: ignored if the id is absent. Shallow merge, no history.
    /// - `Delete`: ignored if the id is absent. Records history, clears redo.
    pub fn apply(&mut self, mutation: Mutation, origin: Origin) -> Applied {
        let changed = match &mutation {
            Mutation::Add(obj) => self.insert(obj),
            Mutation::Update { id, updates } => self.merge(id, updates),
            Mutation::Delete(id) => self.remove(id),
        };
        if !changed {
            debug!(?origin, ?mutation, "doc: mutation ignored");
            return Applied::Ignored;
        }

        let emit = match origin {
            Origin::Local => Some(mutation.into_frame()),
            Origin::Remote => None,
        };
        Applied::Changed { emit }
    }

    /// Restore the snapshot taken before the most recent add/delete.
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.objects, previous);
        self.redo.push(current);
        true
    }

    /// Reapply the most recently undone snapshot.
    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.objects, next);
        self.push_history(current);
        true
    }

    /// Clear objects, history, and redo. Local only.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.history.clear();
        self.redo.clear();
    }

    fn insert(&mut self, obj: &BoardObject) -> bool {
        if self.contains(&obj.id) {
            return false;
        }
        self.record();
        self.objects.push(obj.clone());
        true
    }

    fn merge(&mut self, id: &str, updates: &ObjectPatch) -> bool {
        let Some(obj) = self.objects.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        obj.apply_patch(updates);
        true
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        self.record();
        self.objects.remove(index);
        true
    }

    /// Snapshot the current state before an add/delete and drop redo.
    fn record(&mut self) {
        let snapshot = self.snapshot();
        self.push_history(snapshot);
        self.redo.clear();
    }

    fn push_history(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot);
        if let Some(limit) = self.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
            }
        }
    }
}
