//! The mutation pipeline: every sanctioned write to the shared layer model.
//!
//! DESIGN
//! ======
//! Each operation is exactly one [`Room::mutate`] call, so a backend applies
//! it atomically and other participants never observe half of it. Policy
//! level rejections (board full, stroke too short, a selected id deleted by
//! someone else) are silent no-ops logged at `debug`; none of them is an
//! error for the caller.
//!
//! Operations act on the local participant's selection as read inside the
//! transaction, not on a copy taken earlier.

#[cfg(test)]
#[path = "mutations_test.rs"]
mod mutations_test;

use tracing::debug;
use uuid::Uuid;

use crate::camera::Point;
use crate::color::Color;
use crate::doc::{Layer, LayerId, PathPoint};
use crate::geometry::{Bounds, Side, normalize_path_points, resize_bounds};
use crate::input::InsertableKind;
use crate::presence::PresencePatch;
use crate::room::{Room, Tracking};

/// Insert a `size`-square layer of `kind` with its top-left at `position` and select it.
///
/// Returns the new id, or `None` when the board already holds `max_layers` layers.
pub fn insert_layer<R: Room + ?Sized>(
    room: &mut R,
    kind: InsertableKind,
    position: Point,
    fill: Color,
    size: f64,
    max_layers: usize,
) -> Option<LayerId> {
    let mut inserted = None;
    room.mutate(Tracking::Record, &mut |storage, me| {
        if storage.len() >= max_layers {
            return;
        }
        let id = Uuid::new_v4();
        storage.insert(id, Layer::new(kind.shape(), Bounds::new(position.x, position.y, size, size), fill));
        me.selection = vec![id];
        inserted = Some(id);
    });
    if inserted.is_none() {
        debug!(?kind, max_layers, "insert rejected: board is full");
    }
    inserted
}

/// Offset every selected layer by `delta`. Ids without a layer are skipped.
pub fn translate_selection<R: Room + ?Sized>(room: &mut R, delta: Point) {
    room.mutate(Tracking::Record, &mut |storage, me| {
        for id in &me.selection {
            match storage.get_mut(id) {
                Some(layer) => layer.translate(delta),
                None => debug!(%id, "translate skipped missing layer"),
            }
        }
    });
}

/// Resize the head of the selection from `initial_bounds`, moving the `corner` edges to `point`.
pub fn resize_selection<R: Room + ?Sized>(room: &mut R, initial_bounds: Bounds, corner: Side, point: Point) {
    let bounds = resize_bounds(initial_bounds, corner, point);
    room.mutate(Tracking::Record, &mut |storage, me| {
        let Some(id) = me.selection.first() else {
            return;
        };
        match storage.get_mut(id) {
            Some(layer) => layer.set_bounds(bounds),
            None => debug!(%id, "resize skipped missing layer"),
        }
    });
}

/// Remove every selected layer and clear the selection. Returns the ids actually removed.
pub fn delete_selection<R: Room + ?Sized>(room: &mut R) -> Vec<LayerId> {
    let mut removed = Vec::new();
    room.mutate(Tracking::Record, &mut |storage, me| {
        removed.clear();
        for id in &me.selection {
            if storage.remove(id).is_some() {
                removed.push(*id);
            }
        }
        me.selection.clear();
    });
    removed
}

/// Positions of the selected ids within the z-order, ascending.
fn selected_positions(layer_ids: &[LayerId], selection: &[LayerId]) -> Vec<usize> {
    layer_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| selection.contains(id))
        .map(|(index, _)| index)
        .collect()
}

/// Move the selected layers to the top of the z-order, keeping their relative order.
pub fn bring_to_front<R: Room + ?Sized>(room: &mut R) {
    room.mutate(Tracking::Record, &mut |storage, me| {
        let positions = selected_positions(storage.layer_ids(), &me.selection);
        let len = storage.layer_ids().len();
        for (i, &from) in positions.iter().enumerate().rev() {
            let to = len - positions.len() + i;
            storage.move_id(from, to);
        }
    });
}

/// Move the selected layers to the bottom of the z-order, keeping their relative order.
pub fn send_to_back<R: Room + ?Sized>(room: &mut R) {
    room.mutate(Tracking::Record, &mut |storage, me| {
        let positions = selected_positions(storage.layer_ids(), &me.selection);
        for (to, &from) in positions.iter().enumerate() {
            storage.move_id(from, to);
        }
    });
}

/// Set the fill of every selected layer.
pub fn set_fill<R: Room + ?Sized>(room: &mut R, fill: Color) {
    room.mutate(Tracking::Record, &mut |storage, me| {
        for id in &me.selection {
            match storage.get_mut(id) {
                Some(layer) => layer.fill = fill,
                None => debug!(%id, "fill skipped missing layer"),
            }
        }
    });
}

/// Turn the local pencil draft into a path layer filled with `fill`.
///
/// The draft is cleared whether or not a layer is created. The selection is
/// left untouched.
pub fn commit_path<R: Room + ?Sized>(room: &mut R, fill: Color, max_layers: usize) -> Option<LayerId> {
    let mut inserted = None;
    room.mutate(Tracking::Record, &mut |storage, me| {
        let Some(draft) = me.pencil_draft.take() else {
            return;
        };
        if storage.len() >= max_layers {
            debug!(max_layers, "path rejected: board is full");
            return;
        }
        match normalize_path_points(&draft, fill) {
            Ok(layer) => {
                let id = Uuid::new_v4();
                storage.insert(id, layer);
                inserted = Some(id);
            }
            Err(e) => debug!(error = %e, "path rejected"),
        }
    });
    inserted
}

/// Set the text of a text or note layer. Typing is not recorded in history.
pub fn update_text<R: Room + ?Sized>(room: &mut R, id: LayerId, value: &str) {
    room.mutate(Tracking::Skip, &mut |storage, _| match storage.get_mut(&id) {
        Some(layer) => layer.value = Some(value.to_owned()),
        None => debug!(%id, "text update skipped missing layer"),
    });
}

/// Replace the selection with nothing, as one undoable step. No-op when already empty.
pub fn clear_selection<R: Room + ?Sized>(room: &mut R) {
    if room.presence().selection.is_empty() {
        return;
    }
    room.update_presence(PresencePatch::selection(Vec::new()), Tracking::Record);
}

/// Replace the selection with a single layer, as one undoable step.
pub fn select_layer<R: Room + ?Sized>(room: &mut R, id: LayerId) {
    room.update_presence(PresencePatch::selection(vec![id]), Tracking::Record);
}

/// Begin a pencil draft at `point` and publish the pen color with it.
pub fn start_draft<R: Room + ?Sized>(room: &mut R, point: Point, pressure: f64, pen_color: Color) {
    let patch = PresencePatch::pencil_draft(Some(vec![PathPoint::new(point.x, point.y, pressure)]))
        .with_pen_color(Some(pen_color));
    room.update_presence(patch, Tracking::Skip);
}

/// Append a sample to the local draft and move the cursor with it.
///
/// Does nothing without a draft. A sample identical to the only recorded one is dropped.
pub fn extend_draft<R: Room + ?Sized>(room: &mut R, point: Point, pressure: f64) {
    let Some(draft) = room.presence().pencil_draft.as_deref() else {
        return;
    };
    let mut next = draft.to_vec();
    let duplicate = matches!(draft, [only] if only.position() == point);
    if !duplicate {
        next.push(PathPoint::new(point.x, point.y, pressure));
    }
    room.update_presence(PresencePatch::pencil_draft(Some(next)).with_cursor(Some(point)), Tracking::Skip);
}
