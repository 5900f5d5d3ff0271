//! Selection bounds resolver and selection chrome layout.
//!
//! The resolver turns the local selection (an ordered list of ids) into the
//! union box of the layers it still resolves to. [`BoundsWatcher`] wraps it
//! with a shallow-equality check so the surface only re-lays out the
//! selection box and toolbar when the box actually moved.
//!
//! Handle geometry is expressed in board space; the camera is pan-only, so a
//! handle is [`HANDLE_WIDTH`] pixels wide at any pan offset.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::camera::{Camera, Point};
use crate::consts::{HANDLE_WIDTH, SELECTION_TOOLBAR_OFFSET};
use crate::doc::{LayerId, LayerKind, Storage};
use crate::geometry::{Bounds, Side, bounding_box_union};

/// Union box of every selected layer that still exists.
///
/// Returns `None` when the selection is empty or none of its ids resolve.
#[must_use]
pub fn selection_bounds(storage: &Storage, selection: &[LayerId]) -> Option<Bounds> {
    bounding_box_union(selection.iter().filter_map(|id| storage.get(id)).map(crate::doc::Layer::bounds))
}

/// Caches the last resolved selection box.
#[derive(Debug, Clone, Default)]
pub struct BoundsWatcher {
    last: Option<Bounds>,
}

impl BoundsWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-resolve the selection box. Returns true only when it differs from the cached one.
    pub fn refresh(&mut self, storage: &Storage, selection: &[LayerId]) -> bool {
        let next = selection_bounds(storage, selection);
        if next == self.last {
            return false;
        }
        self.last = next;
        true
    }

    #[must_use]
    pub fn current(&self) -> Option<Bounds> {
        self.last
    }
}

/// The single selected layer, if exactly one id is selected and it resolves.
#[must_use]
pub fn solo_selection(storage: &Storage, selection: &[LayerId]) -> Option<LayerId> {
    match selection {
        [id] if storage.contains(id) => Some(*id),
        _ => None,
    }
}

/// Resize handles are shown for exactly one selected layer that is not a freehand path.
#[must_use]
pub fn shows_resize_handles(storage: &Storage, selection: &[LayerId]) -> bool {
    solo_selection(storage, selection)
        .and_then(|id| storage.get(&id))
        .is_some_and(|layer| layer.kind() != LayerKind::Path)
}

/// One square resize handle around the selection box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Edges this handle drags.
    pub side: Side,
    /// Handle square in board space.
    pub bounds: Bounds,
    /// CSS cursor shown while hovering the handle.
    pub cursor: &'static str,
}

/// CSS resize cursor for a handle dragging `side`.
#[must_use]
pub fn handle_cursor(side: Side) -> &'static str {
    let vertical = side.contains(Side::TOP) || side.contains(Side::BOTTOM);
    let horizontal = side.contains(Side::LEFT) || side.contains(Side::RIGHT);
    match (vertical, horizontal) {
        (true, false) => "ns-resize",
        (false, true) => "ew-resize",
        (true, true) if side.contains(Side::TOP) == side.contains(Side::LEFT) => "nwse-resize",
        (true, true) => "nesw-resize",
        (false, false) => "default",
    }
}

/// The eight handles around `bounds`, clockwise from the top-left corner.
#[must_use]
pub fn resize_handles(bounds: Bounds) -> [Handle; 8] {
    let left = bounds.x;
    let center_x = bounds.x + bounds.width / 2.0;
    let right = bounds.right();
    let top = bounds.y;
    let center_y = bounds.y + bounds.height / 2.0;
    let bottom = bounds.bottom();

    let handle = |side: Side, cx: f64, cy: f64| Handle {
        side,
        bounds: Bounds::new(cx - HANDLE_WIDTH / 2.0, cy - HANDLE_WIDTH / 2.0, HANDLE_WIDTH, HANDLE_WIDTH),
        cursor: handle_cursor(side),
    };

    [
        handle(Side::TOP | Side::LEFT, left, top),
        handle(Side::TOP, center_x, top),
        handle(Side::TOP | Side::RIGHT, right, top),
        handle(Side::RIGHT, right, center_y),
        handle(Side::BOTTOM | Side::RIGHT, right, bottom),
        handle(Side::BOTTOM, center_x, bottom),
        handle(Side::BOTTOM | Side::LEFT, left, bottom),
        handle(Side::LEFT, left, center_y),
    ]
}

/// Screen-space anchor of the floating selection toolbar: centred above the box.
#[must_use]
pub fn selection_toolbar_anchor(bounds: Bounds, camera: &Camera) -> Point {
    Point::new(
        bounds.x + bounds.width / 2.0 + camera.x,
        bounds.y + camera.y - SELECTION_TOOLBAR_OFFSET,
    )
}
