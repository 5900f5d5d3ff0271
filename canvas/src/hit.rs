//! Hit-testing: which handle or layer is under a board-space point.
//!
//! The surface is a single canvas element, so the engine has to decide
//! itself whether a pointer-down landed on a resize handle, on a layer, or
//! on empty board. Handles win over layers, and layers are tested from the
//! top of the z-order down.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::{LayerId, Storage};
use crate::geometry::{Bounds, Side};
use crate::selection::{resize_handles, selection_bounds, shows_resize_handles};

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    /// A resize handle of the current selection box.
    ResizeHandle {
        side: Side,
        /// Selection box at the moment the handle was grabbed.
        initial_bounds: Bounds,
    },
    /// The body of a layer.
    Layer(LayerId),
}

/// Test `point` against the selection handles (when visible), then every layer topmost first.
#[must_use]
pub fn hit_test(point: Point, storage: &Storage, selection: &[LayerId]) -> Option<Hit> {
    if let Some(hit) = hit_handle(point, storage, selection) {
        return Some(hit);
    }
    hit_layer(point, storage).map(Hit::Layer)
}

fn hit_handle(point: Point, storage: &Storage, selection: &[LayerId]) -> Option<Hit> {
    if !shows_resize_handles(storage, selection) {
        return None;
    }
    let bounds = selection_bounds(storage, selection)?;
    resize_handles(bounds)
        .into_iter()
        .find(|handle| handle.bounds.contains(point))
        .map(|handle| Hit::ResizeHandle { side: handle.side, initial_bounds: bounds })
}

/// Topmost layer whose box contains `point`.
#[must_use]
pub fn hit_layer(point: Point, storage: &Storage) -> Option<LayerId> {
    storage
        .ordered()
        .rev()
        .find(|(_, layer)| layer.bounds().contains(point))
        .map(|(id, _)| id)
}
