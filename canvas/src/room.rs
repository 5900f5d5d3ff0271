//! The synchronized room: the shared-state contract the engine runs against.
//!
//! DESIGN
//! ======
//! The engine never assumes a particular replication algorithm. It needs a
//! store it can mutate transactionally, its own presence, the presence of
//! peers, and an undo history. [`Room`] is that seam. Any backend that
//! applies each `mutate` call atomically and converges per field can sit
//! behind it.
//!
//! [`LocalRoom`] is the in-process implementation used by the browser
//! engine and by tests. Remote traffic is fed into it through
//! [`LocalRoom::apply_remote`] and the peer methods, none of which touch
//! the local history.
//!
//! A recorded `mutate` runs with the storage journal open, so its history
//! entry holds only the ids it touched. Undo replays that entry backwards
//! over whatever the board looks like now: a layer a peer deleted stays
//! deleted, and a field only a peer changed keeps the peer's value.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use tracing::{debug, warn};

use crate::doc::Storage;
use crate::history::{Change, History};
use crate::presence::{ConnectionId, Peer, Presence, PresencePatch, UserInfo};

/// Whether a presence update becomes part of the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Record the change as (part of) an undo entry.
    Record,
    /// Apply without touching history.
    Skip,
}

/// A shared, multi-writer board as seen by one participant.
pub trait Room {
    /// Read view of the shared layers.
    fn storage(&self) -> &Storage;

    /// This participant's presence.
    fn presence(&self) -> &Presence;

    /// This participant's connection id.
    fn connection_id(&self) -> ConnectionId;

    /// Every other participant currently connected.
    fn others(&self) -> &[Peer];

    /// Apply `mutation` as one atomic change. A change to layers or to the
    /// selection becomes (part of) an undo entry when `tracking` is `Record`.
    fn mutate(&mut self, tracking: Tracking, mutation: &mut dyn FnMut(&mut Storage, &mut Presence));

    /// Patch this participant's presence.
    fn update_presence(&mut self, patch: PresencePatch, tracking: Tracking);

    fn pause_history(&mut self);
    fn resume_history(&mut self);

    /// Returns false when there was nothing to undo.
    fn undo(&mut self) -> bool;

    /// Returns false when there was nothing to redo.
    fn redo(&mut self) -> bool;

    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
}

/// Single-process room: local storage, local history, and a peer list fed by the host.
pub struct LocalRoom {
    connection_id: ConnectionId,
    info: Option<UserInfo>,
    storage: Storage,
    me: Presence,
    others: Vec<Peer>,
    history: History,
    history_limit: usize,
}

impl LocalRoom {
    #[must_use]
    pub fn new(connection_id: ConnectionId, history_limit: usize) -> Self {
        Self {
            connection_id,
            info: None,
            storage: Storage::new(),
            me: Presence::default(),
            others: Vec::new(),
            history: History::new(history_limit),
            history_limit,
        }
    }

    /// Attach the identity provider's profile for the local user.
    #[must_use]
    pub fn with_info(mut self, info: UserInfo) -> Self {
        self.info = Some(info);
        self
    }

    #[must_use]
    pub fn info(&self) -> Option<&UserInfo> {
        self.info.as_ref()
    }

    /// Replace the layers with a snapshot from the backend. History is discarded
    /// along with any selection of layers that no longer exist.
    pub fn load_storage(&mut self, storage: Storage) {
        self.storage = storage;
        let storage = &self.storage;
        self.me.selection.retain(|id| storage.contains(id));
        self.history = History::new(self.history_limit);
    }

    /// Apply a change committed by another participant. It is not undoable
    /// locally, and later local undo/redo leaves what it wrote in place
    /// unless the same field of the same layer is involved.
    pub fn apply_remote(&mut self, mutation: impl FnOnce(&mut Storage)) {
        mutation(&mut self.storage);
    }

    /// Register a peer, replacing any existing entry with the same connection id.
    pub fn join_peer(&mut self, peer: Peer) {
        debug!(connection_id = peer.connection_id, "peer joined");
        match self.others.iter_mut().find(|p| p.connection_id == peer.connection_id) {
            Some(existing) => *existing = peer,
            None => self.others.push(peer),
        }
    }

    /// Patch a peer's presence. Updates for unknown peers are dropped.
    pub fn update_peer(&mut self, connection_id: ConnectionId, patch: PresencePatch) {
        match self.others.iter_mut().find(|p| p.connection_id == connection_id) {
            Some(peer) => peer.presence.apply(patch),
            None => warn!(connection_id, "presence update for unknown peer"),
        }
    }

    pub fn leave_peer(&mut self, connection_id: ConnectionId) {
        debug!(connection_id, "peer left");
        self.others.retain(|p| p.connection_id != connection_id);
    }

    /// The history, for inspection.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

}

impl Room for LocalRoom {
    fn storage(&self) -> &Storage {
        &self.storage
    }

    fn presence(&self) -> &Presence {
        &self.me
    }

    fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    fn others(&self) -> &[Peer] {
        &self.others
    }

    fn mutate(&mut self, tracking: Tracking, mutation: &mut dyn FnMut(&mut Storage, &mut Presence)) {
        if tracking == Tracking::Skip {
            mutation(&mut self.storage, &mut self.me);
            return;
        }
        let selection = self.me.selection.clone();
        self.storage.begin_journal();
        mutation(&mut self.storage, &mut self.me);
        let journal = self.storage.take_journal();
        let change = Change::from_journal(journal, &self.storage, selection, &self.me.selection);
        self.history.record(change);
    }

    fn update_presence(&mut self, patch: PresencePatch, tracking: Tracking) {
        let before = (tracking == Tracking::Record && patch.selection.is_some()).then(|| self.me.selection.clone());
        self.me.apply(patch);
        if let Some(before) = before {
            self.history.record(Change::selection(before, self.me.selection.clone()));
        }
    }

    fn pause_history(&mut self) {
        self.history.pause();
    }

    fn resume_history(&mut self) {
        self.history.resume();
    }

    fn undo(&mut self) -> bool {
        let Some(change) = self.history.undo() else {
            return false;
        };
        change.revert(&mut self.storage, &mut self.me.selection);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(change) = self.history.redo() else {
            return false;
        };
        change.apply(&mut self.storage, &mut self.me.selection);
        true
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
