//! Layer model: the shapes on a board and the store that owns them.
//!
//! A board is a map from [`LayerId`] to [`Layer`] plus a separate z-order
//! list of ids (index 0 is the back). [`Storage`] keeps both and guarantees
//! that the id list and the map's key set never drift apart; every
//! mutation goes through its methods.
//!
//! Data flows into this layer from the synchronized room (JSON snapshots)
//! and from the mutation pipeline. The renderer reads layers back-to-front
//! via [`Storage::ordered`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::camera::Point;
use crate::color::Color;
use crate::geometry::Bounds;

/// Unique identifier for a layer, generated client-side.
pub type LayerId = Uuid;

/// Error raised while hydrating or exporting a storage snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// The snapshot was not valid JSON or contained an unknown layer type.
    #[error("failed to decode storage snapshot: {0}")]
    Decode(#[from] serde_json::Error),
    /// The same id appears more than once in the z-order list.
    #[error("layer id listed twice in z-order: {0}")]
    DuplicateId(LayerId),
    /// The z-order list and the layer map have different id sets.
    #[error("z-order mismatch: {} ids without a layer, {} layers without an id", .orphaned.len(), .unordered.len())]
    Integrity { orphaned: Vec<LayerId>, unordered: Vec<LayerId> },
}

/// The tag of a layer, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Text,
    Note,
    Rectangle,
    Ellipse,
    Path,
}

/// One freehand sample, stored relative to its path's top-left corner.
///
/// Serialized as a `[x, y, pressure]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
}

impl PathPoint {
    #[must_use]
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }

    #[must_use]
    pub fn position(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<[f64; 3]> for PathPoint {
    fn from([x, y, pressure]: [f64; 3]) -> Self {
        Self { x, y, pressure }
    }
}

impl From<PathPoint> for [f64; 3] {
    fn from(p: PathPoint) -> Self {
        [p.x, p.y, p.pressure]
    }
}

/// Per-kind payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Text,
    Note,
    Rectangle,
    Ellipse,
    /// Freehand stroke; `points` are relative to the layer's `(x, y)`.
    Path { points: Vec<PathPoint> },
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Text => LayerKind::Text,
            Self::Note => LayerKind::Note,
            Self::Rectangle => LayerKind::Rectangle,
            Self::Ellipse => LayerKind::Ellipse,
            Self::Path { .. } => LayerKind::Path,
        }
    }
}

/// A shape on the board as stored in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(flatten)]
    pub shape: Shape,
    /// Left edge in board coordinates.
    pub x: f64,
    /// Top edge in board coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
    /// Text content for text and note layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Layer {
    #[must_use]
    pub fn new(shape: Shape, bounds: Bounds, fill: Color) -> Self {
        Self {
            shape,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            fill,
            value: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.shape.kind()
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    pub fn translate(&mut self, delta: Point) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Freehand samples; empty for every kind except paths.
    #[must_use]
    pub fn points(&self) -> &[PathPoint] {
        match &self.shape {
            Shape::Path { points } => points,
            _ => &[],
        }
    }
}

/// A layer together with its z-order index.
pub type Placed = (Layer, usize);

/// What an open journal saw before its first write to each id.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    /// Touched ids in first-touch order, with the layer and index they had then.
    pub layers: Vec<(LayerId, Option<Placed>)>,
    /// The z-order before the first reorder, if any.
    pub order: Option<Vec<LayerId>>,
}

/// The shared layer map and its z-order.
///
/// While a journal is open (see [`Storage::begin_journal`]) every write
/// captures the prior state of the ids it touches, once per id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    layers: HashMap<LayerId, Layer>,
    layer_ids: Vec<LayerId>,
    #[serde(skip)]
    journal: Option<Journal>,
}

impl PartialEq for Storage {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers && self.layer_ids == other.layer_ids
    }
}

impl Storage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a JSON snapshot, rejecting unknown layer types and z-order drift.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Decode`] for malformed JSON or unknown `type` tags, and
    /// [`LayerError::DuplicateId`] / [`LayerError::Integrity`] when the id list and the
    /// layer map disagree.
    pub fn from_json(raw: &str) -> Result<Self, LayerError> {
        let storage: Self = serde_json::from_str(raw).inspect_err(|e| warn!(error = %e, "rejected storage snapshot"))?;
        storage.check_integrity()?;
        Ok(storage)
    }

    /// Serialize to the snapshot format accepted by [`Storage::from_json`].
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Decode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, LayerError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Verify that every id in the z-order has a layer and vice versa.
    ///
    /// # Errors
    ///
    /// See [`Storage::from_json`].
    pub fn check_integrity(&self) -> Result<(), LayerError> {
        let mut seen = HashSet::with_capacity(self.layer_ids.len());
        for id in &self.layer_ids {
            if !seen.insert(*id) {
                return Err(LayerError::DuplicateId(*id));
            }
        }
        let orphaned: Vec<LayerId> = self.layer_ids.iter().filter(|id| !self.layers.contains_key(*id)).copied().collect();
        let unordered: Vec<LayerId> = self.layers.keys().filter(|id| !seen.contains(*id)).copied().collect();
        if orphaned.is_empty() && unordered.is_empty() {
            Ok(())
        } else {
            warn!(orphaned = orphaned.len(), unordered = unordered.len(), "storage z-order mismatch");
            Err(LayerError::Integrity { orphaned, unordered })
        }
    }

    /// Add a layer on top of the z-order. Replaces the payload if the id already exists.
    pub fn insert(&mut self, id: LayerId, layer: Layer) {
        self.touch(&id);
        if self.layers.insert(id, layer).is_none() {
            self.layer_ids.push(id);
        }
    }

    /// Add a layer at `index` in the z-order, clamped to the top. Replaces the
    /// payload in place if the id already exists.
    pub fn insert_at(&mut self, id: LayerId, layer: Layer, index: usize) {
        self.touch(&id);
        if self.layers.insert(id, layer).is_none() {
            let index = index.min(self.layer_ids.len());
            self.layer_ids.insert(index, id);
        }
    }

    /// Remove a layer and its z-order entry, returning it if it was present.
    pub fn remove(&mut self, id: &LayerId) -> Option<Layer> {
        self.touch(id);
        if let Some(index) = self.position(id) {
            self.layer_ids.remove(index);
        }
        self.layers.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.touch(id);
        self.layers.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    /// Index of `id` in the z-order, if listed.
    #[must_use]
    pub fn position(&self, id: &LayerId) -> Option<usize> {
        self.layer_ids.iter().position(|candidate| candidate == id)
    }

    /// Move the id at `from` so that it ends up at `to`, shifting the ids in between.
    /// Returns false when either index is out of range.
    pub fn move_id(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layer_ids.len() || to >= self.layer_ids.len() {
            return false;
        }
        self.capture_order();
        let id = self.layer_ids.remove(from);
        self.layer_ids.insert(to, id);
        true
    }

    /// Put the listed ids into the listed order, reusing the z-order slots they
    /// currently occupy. Unlisted ids keep their slots; absent ids are skipped.
    pub fn arrange(&mut self, order: &[LayerId]) {
        let mut seen = HashSet::with_capacity(order.len());
        let wanted: Vec<LayerId> = order
            .iter()
            .filter(|id| self.layers.contains_key(*id) && seen.insert(**id))
            .copied()
            .collect();
        let slots: Vec<usize> = self
            .layer_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| seen.contains(*id))
            .map(|(slot, _)| slot)
            .collect();
        if wanted.iter().zip(&slots).all(|(id, slot)| self.layer_ids[*slot] == *id) {
            return;
        }
        self.capture_order();
        for (slot, id) in slots.into_iter().zip(wanted) {
            self.layer_ids[slot] = id;
        }
    }

    /// Start capturing prior states. An already open journal is discarded.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Journal::default());
    }

    /// Close the journal and hand back what it captured.
    pub fn take_journal(&mut self) -> Journal {
        self.journal.take().unwrap_or_default()
    }

    fn touch(&mut self, id: &LayerId) {
        let Some(journal) = self.journal.as_mut() else {
            return;
        };
        if journal.layers.iter().any(|(touched, _)| touched == id) {
            return;
        }
        let index = self.layer_ids.iter().position(|candidate| candidate == id);
        let before = self.layers.get(id).cloned().zip(index);
        journal.layers.push((*id, before));
    }

    fn capture_order(&mut self) {
        if let Some(journal) = self.journal.as_mut() {
            if journal.order.is_none() {
                journal.order = Some(self.layer_ids.clone());
            }
        }
    }

    /// Ids in z-order, back to front.
    #[must_use]
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layer_ids
    }

    /// Layers in z-order, back to front.
    pub fn ordered(&self) -> impl DoubleEndedIterator<Item = (LayerId, &Layer)> + '_ {
        self.layer_ids
            .iter()
            .filter_map(|id| self.layers.get(id).map(|layer| (*id, layer)))
    }

    /// Number of layers currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the store contains no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
