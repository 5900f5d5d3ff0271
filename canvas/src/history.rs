//! Undo/redo history for layer mutations.
//!
//! Entries are [`Change`]s: for every layer one mutation touched, the layer
//! as it was before and after, plus any z-order or selection difference.
//! Replaying an entry moves only those ids and only the fields that
//! differ, so edits peers made in the meantime survive an undo. While the
//! history is paused, changes merge into one pending entry; resuming closes
//! it. This is what collapses a drag of N pointer-move ticks into one step.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::HashSet;

use tracing::debug;

use crate::doc::{Journal, Layer, LayerId, Placed, Storage};

/// One layer's state on both sides of a change. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerChange {
    pub id: LayerId,
    pub before: Option<Placed>,
    pub after: Option<Placed>,
}

impl LayerChange {
    fn is_noop(&self) -> bool {
        match (&self.before, &self.after) {
            (None, None) => true,
            (Some((before, _)), Some((after, _))) => before == after,
            _ => false,
        }
    }

    /// Move `storage` from `from` toward `to` for this id only.
    fn replay(&self, storage: &mut Storage, from: Option<&Placed>, to: Option<&Placed>) {
        match (from, to) {
            (_, None) => {
                storage.remove(&self.id);
            }
            (Some((from, _)), Some((to, _))) => {
                if let Some(current) = storage.get_mut(&self.id) {
                    apply_fields(current, from, to);
                }
            }
            (None, Some((to, index))) => {
                if !storage.contains(&self.id) {
                    storage.insert_at(self.id, to.clone(), *index);
                }
            }
        }
    }
}

/// Copy every field that differs between `from` and `to` onto `current`.
/// Fields a peer changed and this change did not are left alone.
#[allow(clippy::float_cmp)]
fn apply_fields(current: &mut Layer, from: &Layer, to: &Layer) {
    if from.shape != to.shape {
        current.shape = to.shape.clone();
    }
    if from.x != to.x {
        current.x = to.x;
    }
    if from.y != to.y {
        current.y = to.y;
    }
    if from.width != to.width {
        current.width = to.width;
    }
    if from.height != to.height {
        current.height = to.height;
    }
    if from.fill != to.fill {
        current.fill = to.fill;
    }
    if from.value != to.value {
        current.value.clone_from(&to.value);
    }
}

/// Everything one participant changed in one undo step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Change {
    layers: Vec<LayerChange>,
    /// Relative z-order of the ids present on both sides, before and after.
    order: Option<(Vec<LayerId>, Vec<LayerId>)>,
    selection: Option<(Vec<LayerId>, Vec<LayerId>)>,
}

impl Change {
    /// Build the change a journaled mutation made, keeping only real differences.
    #[must_use]
    pub fn from_journal(
        journal: Journal,
        storage: &Storage,
        selection_before: Vec<LayerId>,
        selection_after: &[LayerId],
    ) -> Self {
        let layers = journal
            .layers
            .into_iter()
            .map(|(id, before)| {
                let after = storage.get(&id).cloned().zip(storage.position(&id));
                LayerChange { id, before, after }
            })
            .filter(|change| !change.is_noop())
            .collect();
        let order = journal.order.and_then(|before| relative_order(before, storage.layer_ids()));
        let selection = (selection_before != selection_after).then(|| (selection_before, selection_after.to_vec()));
        Self { layers, order, selection }
    }

    /// A change that only moves the local selection.
    #[must_use]
    pub fn selection(before: Vec<LayerId>, after: Vec<LayerId>) -> Self {
        let selection = (before != after).then_some((before, after));
        Self { selection, ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.order.is_none() && self.selection.is_none()
    }

    /// Fold a later change into this one: first `before` and latest `after` win.
    pub fn merge(&mut self, later: Self) {
        for change in later.layers {
            match self.layers.iter_mut().find(|existing| existing.id == change.id) {
                Some(existing) => existing.after = change.after,
                None => self.layers.push(change),
            }
        }
        self.layers.retain(|change| !change.is_noop());

        self.order = match (self.order.take(), later.order) {
            (Some((before, _)), Some((_, after))) => relative_order(before, &after),
            (first, second) => first.or(second),
        };

        self.selection = match (self.selection.take(), later.selection) {
            (Some((before, _)), Some((_, after))) => (before != after).then_some((before, after)),
            (first, second) => first.or(second),
        };
    }

    /// Re-apply this change on top of the current state.
    pub fn apply(&self, storage: &mut Storage, selection: &mut Vec<LayerId>) {
        for change in &self.layers {
            change.replay(storage, change.before.as_ref(), change.after.as_ref());
        }
        if let Some((_, after)) = &self.order {
            storage.arrange(after);
        }
        if let Some((_, after)) = &self.selection {
            set_selection(selection, after, storage);
        }
    }

    /// Undo this change on top of the current state.
    pub fn revert(&self, storage: &mut Storage, selection: &mut Vec<LayerId>) {
        for change in self.layers.iter().rev() {
            change.replay(storage, change.after.as_ref(), change.before.as_ref());
        }
        if let Some((before, _)) = &self.order {
            storage.arrange(before);
        }
        if let Some((before, _)) = &self.selection {
            set_selection(selection, before, storage);
        }
    }
}

/// The two orders restricted to ids they share, or `None` if those ids kept their order.
fn relative_order(before: Vec<LayerId>, after: &[LayerId]) -> Option<(Vec<LayerId>, Vec<LayerId>)> {
    let before_set: HashSet<&LayerId> = before.iter().collect();
    let after_set: HashSet<&LayerId> = after.iter().collect();
    let after: Vec<LayerId> = after.iter().filter(|id| before_set.contains(id)).copied().collect();
    let before: Vec<LayerId> = before.iter().filter(|id| after_set.contains(id)).copied().collect();
    (before != after).then_some((before, after))
}

fn set_selection(selection: &mut Vec<LayerId>, target: &[LayerId], storage: &Storage) {
    selection.clear();
    selection.extend(target.iter().filter(|id| storage.contains(id)));
}

/// Bounded undo/redo stacks with pause/resume grouping.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Change>,
    redo: Vec<Change>,
    paused: bool,
    pending: Option<Change>,
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { undo: Vec::new(), redo: Vec::new(), paused: false, pending: None, limit: limit.max(1) }
    }

    /// Record a change. Empty changes are dropped; while paused, changes merge.
    pub fn record(&mut self, change: Change) {
        if change.is_empty() {
            return;
        }
        if !self.paused {
            self.push(change);
            return;
        }
        match self.pending.as_mut() {
            Some(pending) => pending.merge(change),
            None => self.pending = Some(change),
        }
    }

    /// Start grouping changes into one entry. Nested pauses are ignored.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.pending = None;
        }
    }

    /// Stop grouping; a group that still changes something becomes one entry.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(change) = self.pending.take().filter(|change| !change.is_empty()) {
            self.push(change);
        }
    }

    /// Move the latest entry to the redo stack and return it for reverting.
    /// Closes an open group first.
    pub fn undo(&mut self) -> Option<&Change> {
        self.resume();
        let change = self.undo.pop()?;
        self.redo.push(change);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "history undo");
        self.redo.last()
    }

    /// Move the latest undone entry back and return it for re-applying.
    pub fn redo(&mut self) -> Option<&Change> {
        self.resume();
        let change = self.redo.pop()?;
        self.undo.push(change);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "history redo");
        self.undo.last()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || self.pending.as_ref().is_some_and(|change| !change.is_empty())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of closed undo entries.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    fn push(&mut self, change: Change) {
        self.undo.push(change);
        self.redo.clear();
        if self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        debug!(undo = self.undo.len(), "history entry recorded");
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::consts::HISTORY_LIMIT)
    }
}
